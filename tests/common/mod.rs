#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use loxwalk::ast::Stmt;
use loxwalk::error::LoxError;
use loxwalk::parser::Parser;
use loxwalk::scanner::Scanner;
use loxwalk::session::{Outcome, Session};

/// An in-memory sink that stays readable after being handed out as a
/// `Box<dyn Write>`.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session wired to in-memory stdout/stderr.
pub struct Harness {
    pub session: Session,
    pub out: SharedBuffer,
    pub err: SharedBuffer,
}

impl Harness {
    pub fn new() -> Self {
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let session = Session::with_io(Box::new(out.clone()), Box::new(err.clone()));

        Self { session, out, err }
    }

    pub fn run(&mut self, source: &str) -> Outcome {
        self.session.run(source)
    }
}

/// Runs `source` in a fresh session: (outcome, stdout, stderr).
pub fn run(source: &str) -> (Outcome, String, String) {
    let mut harness = Harness::new();
    let outcome = harness.run(source);

    (outcome, harness.out.contents(), harness.err.contents())
}

pub fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
    let (tokens, lex_errors) = Scanner::new(source.as_bytes()).scan_all();
    assert!(lex_errors.is_empty(), "unexpected lexical errors: {:?}", lex_errors);

    Parser::new(tokens).parse()
}

pub fn messages(errors: &[LoxError]) -> Vec<String> {
    errors.iter().map(ToString::to_string).collect()
}
