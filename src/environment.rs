//! Lexical scope frames.
//!
//! Frames are shared (`Rc<RefCell<_>>`): a block, a call and every closure
//! created inside them may all hold the same frame, and a write through one
//! holder is visible to all others.  A frame's parent is fixed at creation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

pub type SharedEnv = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<SharedEnv>,
}

impl Environment {
    /// A root (global) frame.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: SharedEnv) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn shared(self) -> SharedEnv {
        Rc::new(RefCell::new(self))
    }

    /// Binds `name` in this frame, overwriting any previous binding.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("define '{}'", name);
        self.values.insert(name.to_string(), value);
    }

    /// Looks `name` up in this frame, then outward.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Rebinds an existing variable, searching outward.  Never creates one.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Reads `name` from exactly the frame `distance` hops up.
    pub fn get_at(&self, distance: usize, name: &Token) -> Result<Value> {
        if distance == 0 {
            return self
                .values
                .get(&name.lexeme)
                .cloned()
                .ok_or_else(|| undefined(name));
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get_at(distance - 1, name),
            None => Err(undefined(name)),
        }
    }

    /// Writes `name` in exactly the frame `distance` hops up.
    pub fn assign_at(&mut self, distance: usize, name: &Token, value: Value) -> Result<()> {
        if distance == 0 {
            return match self.values.get_mut(&name.lexeme) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(undefined(name)),
            };
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign_at(distance - 1, name, value),
            None => Err(undefined(name)),
        }
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name.line, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod environment_tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn get_walks_outward() {
        let global: SharedEnv = Environment::new().shared();
        global.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::with_enclosing(Rc::clone(&global));

        assert_eq!(inner.get(&ident("a")).unwrap(), Value::Number(1.0));
        assert!(inner.get(&ident("b")).is_err());
    }

    #[test]
    fn assign_never_creates_a_binding() {
        let mut env = Environment::new();

        let err = env.assign(&ident("x"), Value::Nil).unwrap_err();

        assert_eq!(err.to_string(), "Undefined variable 'x'.\n[line 1]");
    }

    #[test]
    fn assign_updates_the_declaring_frame() {
        let global: SharedEnv = Environment::new().shared();
        global.borrow_mut().define("a", Value::Number(1.0));

        let mut inner = Environment::with_enclosing(Rc::clone(&global));
        inner.assign(&ident("a"), Value::Number(2.0)).unwrap();

        assert_eq!(global.borrow().get(&ident("a")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn at_distance_skips_shadowing_frames() {
        let global: SharedEnv = Environment::new().shared();
        global.borrow_mut().define("a", Value::String("outer".into()));

        let middle: SharedEnv = Environment::with_enclosing(Rc::clone(&global)).shared();
        middle.borrow_mut().define("a", Value::String("middle".into()));

        let mut inner = Environment::with_enclosing(Rc::clone(&middle));
        inner.define("a", Value::String("inner".into()));

        assert_eq!(
            inner.get_at(2, &ident("a")).unwrap(),
            Value::String("outer".into())
        );

        inner
            .assign_at(1, &ident("a"), Value::String("changed".into()))
            .unwrap();

        assert_eq!(
            middle.borrow().get_at(0, &ident("a")).unwrap(),
            Value::String("changed".into())
        );
        assert_eq!(
            inner.get_at(0, &ident("a")).unwrap(),
            Value::String("inner".into())
        );
    }

    #[test]
    fn get_at_does_not_fall_back_outward() {
        let global: SharedEnv = Environment::new().shared();
        global.borrow_mut().define("a", Value::Nil);

        let inner = Environment::with_enclosing(Rc::clone(&global));

        assert!(inner.get_at(0, &ident("a")).is_err());
    }
}
