mod common;

#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;

    use loxwalk::interpreter::Interpreter;
    use loxwalk::resolver::Resolver;

    use crate::common::{messages, parse};

    fn resolve_errors(source: &str) -> Vec<String> {
        let statements = parse(source).expect("source should parse");
        let mut interpreter = Interpreter::new();

        match Resolver::new(&mut interpreter).resolve(&statements) {
            Ok(()) => Vec::new(),
            Err(errors) => messages(&errors),
        }
    }

    #[test]
    fn well_formed_program_has_no_errors() {
        let source = "
            var a = 1;
            fun outer() {
                var b = a;
                fun inner() { return b; }
                return inner;
            }
            class A { init() { this.x = 1; } get() { return this.x; } }
            class B < A { get() { return super.get(); } }
        ";

        assert_eq!(resolve_errors(source), Vec::<String>::new());
    }

    #[test]
    fn global_redeclaration_is_allowed() {
        assert_eq!(resolve_errors("var a = 1; var a = 2;"), Vec::<String>::new());
    }

    #[test]
    fn global_self_reference_in_initializer_is_allowed() {
        assert_eq!(resolve_errors("var a = a;"), Vec::<String>::new());
    }

    #[test]
    fn local_redeclaration_is_an_error() {
        assert_eq!(
            resolve_errors("{\n  var a = 1;\n  var a = 2;\n}"),
            vec!["[line 3] Error at 'a': Already a variable with this name in this scope."]
        );
        assert_eq!(
            resolve_errors("fun f(a, a) {}"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn local_read_in_own_initializer() {
        assert_eq!(
            resolve_errors("var a = 1; { var a = a; }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn return_outside_function() {
        assert_eq!(
            resolve_errors("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn return_value_from_initializer() {
        assert_eq!(
            resolve_errors("class A { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );
        // A bare return is fine.
        assert_eq!(
            resolve_errors("class A { init() { return; } }"),
            Vec::<String>::new()
        );
    }

    #[test]
    fn this_outside_class() {
        assert_eq!(
            resolve_errors("print this;"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(
            resolve_errors("fun f() { return this; }"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
    }

    #[test]
    fn super_misuse() {
        assert_eq!(
            resolve_errors("super.foo();"),
            vec!["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );
        assert_eq!(
            resolve_errors("class A { f() { super.f(); } }"),
            vec!["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn class_inheriting_from_itself() {
        assert_eq!(
            resolve_errors("class A < A {}"),
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn errors_accumulate_in_source_order() {
        let source = "return;\nprint this;\n{ var x = 1; var x = 2; }";

        assert_eq!(
            resolve_errors(source),
            vec![
                "[line 1] Error at 'return': Can't return from top-level code.",
                "[line 2] Error at 'this': Can't use 'this' outside of a class.",
                "[line 3] Error at 'x': Already a variable with this name in this scope.",
            ]
        );
    }
}
