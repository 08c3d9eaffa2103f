mod common;

#[cfg(test)]
mod parser_tests {
    use pretty_assertions::assert_eq;

    use loxwalk::ast::{Expr, Stmt};
    use loxwalk::ast_printer::AstPrinter;
    use loxwalk::parser::Parser;
    use loxwalk::scanner::Scanner;

    use crate::common::{messages, parse};

    fn print_expression(source: &str) -> String {
        let (tokens, _) = Scanner::new(source.as_bytes()).scan_all();
        let expr = Parser::new(tokens)
            .parse_expression()
            .expect("expression should parse");

        AstPrinter::print(&expr)
    }

    fn parse_errors(source: &str) -> Vec<String> {
        messages(&parse(source).expect_err("source should not parse"))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(print_expression("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(print_expression("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
    }

    #[test]
    fn unary_and_comparison_levels() {
        assert_eq!(
            print_expression("-a < b == !c"),
            "(== (< (- a) b) (! c))"
        );
    }

    #[test]
    fn logical_operators_sit_below_equality() {
        assert_eq!(
            print_expression("a or b and c == d"),
            "(or a (and b (== c d)))"
        );
    }

    #[test]
    fn ternary_is_right_associative_and_below_or() {
        assert_eq!(print_expression("a ? b : c ? d : e"), "(?: a b (?: c d e))");
        assert_eq!(print_expression("a or b ? 1 : 2"), "(?: (or a b) 1.0 2.0)");
    }

    #[test]
    fn comma_is_the_lowest_precedence() {
        assert_eq!(
            print_expression("a = 1, b = 2"),
            "(, (= a 1.0) (= b 2.0))"
        );
    }

    #[test]
    fn call_arguments_are_not_comma_expressions() {
        assert_eq!(print_expression("f(1, 2)(3)"), "(call (call f 1.0 2.0) 3.0)");
    }

    #[test]
    fn property_access_and_assignment() {
        assert_eq!(
            print_expression("a.b.c = this.d"),
            "(= (. (. a b) c) (. this d))"
        );
        assert_eq!(print_expression("super.greet()"), "(call (super greet))");
    }

    #[test]
    fn for_loop_desugars_into_while_inside_block() {
        let statements = parse("for (var i = 0; i < 3; i = i + 1) print i;").unwrap();

        assert_eq!(statements.len(), 1);
        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected block, got {:?}", statements[0]);
        };
        assert_eq!(outer.len(), 2);
        assert!(matches!(outer[0], Stmt::Var { .. }));

        let Stmt::While { body, .. } = &outer[1] else {
            panic!("expected while, got {:?}", outer[1]);
        };
        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected block body, got {:?}", body);
        };
        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn bare_for_loop_has_true_condition_and_no_wrapping_block() {
        let statements = parse("for (;;) print 1;").unwrap();

        assert!(matches!(
            &statements[0],
            Stmt::While {
                condition: Expr::Literal(_),
                ..
            }
        ));
    }

    #[test]
    fn class_with_superclass_and_methods() {
        let statements = parse("class B < A { init(x) { this.x = x; } greet() {} }").unwrap();

        let Stmt::Class {
            name,
            superclass,
            methods,
        } = &statements[0]
        else {
            panic!("expected class");
        };

        assert_eq!(name.lexeme, "B");
        assert!(matches!(superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));
        let names: Vec<&str> = methods.iter().map(|m| m.name.lexeme.as_str()).collect();
        assert_eq!(names, vec!["init", "greet"]);
        assert_eq!(methods[0].params.len(), 1);
    }

    #[test]
    fn identical_references_get_distinct_identities() {
        let statements = parse("a; a;").unwrap();

        let ids: Vec<_> = statements
            .iter()
            .map(|stmt| match stmt {
                Stmt::Expression(Expr::Variable { id, .. }) => *id,
                other => panic!("unexpected {:?}", other),
            })
            .collect();

        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn invalid_assignment_target_is_reported() {
        assert_eq!(
            parse_errors("1 = 2;"),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
        assert_eq!(
            parse_errors("a + b = c;"),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn missing_semicolon_at_end_of_input() {
        assert_eq!(
            parse_errors("print 1"),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
    }

    #[test]
    fn recovery_reports_every_independent_error() {
        assert_eq!(
            parse_errors("var = 1;\nprint 2;\nvar x = ;"),
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 3] Error at ';': Expect expression.",
            ]
        );
    }

    #[test]
    fn binary_operator_without_left_operand() {
        assert_eq!(
            parse_errors("* 3;\nprint 1;"),
            vec!["[line 1] Error at '*': Missing left-hand operand."]
        );
        assert_eq!(
            parse_errors("== 1;"),
            vec!["[line 1] Error at '==': Missing left-hand operand."]
        );
    }

    #[test]
    fn ternary_requires_colon() {
        assert_eq!(
            parse_errors("a ? b;"),
            vec!["[line 1] Error at ';': Expect ':' after then branch of conditional expression."]
        );
    }

    #[test]
    fn too_many_arguments_is_a_soft_error() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});\nprint 1 +;", args.join(", "));

        assert_eq!(
            parse_errors(&source),
            vec![
                "[line 1] Error at '255': Can't have more than 255 arguments.",
                "[line 2] Error at ';': Expect expression.",
            ]
        );
    }

    #[test]
    fn too_many_parameters_is_a_soft_error() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));

        assert_eq!(
            parse_errors(&source),
            vec!["[line 1] Error at 'p255': Can't have more than 255 parameters."]
        );
    }
}
