//! The pipeline a driver runs per compilation unit:
//! scan → parse → resolve → interpret.
//!
//! A [`Session`] keeps one interpreter (and so one global environment) alive
//! across many runs, which is what the REPL needs.  Diagnostics are written
//! to the session's error sink; the flags tell the caller which tier failed.

use std::io::{self, Write};

use log::{debug, info, warn};

use crate::ast::Stmt;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// What happened to the last piece of source handed to [`Session::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    /// Lexical, syntax or resolution errors; nothing was executed.
    StaticError,
    RuntimeError,
}

pub struct Session {
    interpreter: Interpreter,
    err: Box<dyn Write>,
    pub had_error: bool,
    pub had_runtime_error: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// stdout for `print`, stderr for diagnostics.
    pub fn new() -> Self {
        Self::with_io(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn with_io(out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
            err,
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Clears both flags; the REPL calls this between lines.
    pub fn reset_errors(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    /// Runs a whole program.
    pub fn run(&mut self, source: &str) -> Outcome {
        info!("Running {} bytes of source", source.len());

        let Some(statements) = self.front_end(source) else {
            return Outcome::StaticError;
        };

        self.execute(&statements)
    }

    /// REPL entry: a line holding a single expression is evaluated and its
    /// value printed; anything else runs as a program.
    pub fn run_line(&mut self, line: &str) -> Outcome {
        let (tokens, lex_errors) = Scanner::new(line.as_bytes()).scan_all();

        if lex_errors.is_empty() {
            if let Ok(expr) = Parser::new(tokens).parse_expression() {
                debug!("REPL line is a bare expression");

                let statement = Stmt::Print(expr);
                let statements = std::slice::from_ref(&statement);

                if self.resolve(statements) {
                    return self.execute(statements);
                }
                return Outcome::StaticError;
            }
        }

        self.run(line)
    }

    /// Scans, parses and resolves.  `None` when any static error was reported.
    fn front_end(&mut self, source: &str) -> Option<Vec<Stmt>> {
        let (tokens, lex_errors) = Scanner::new(source.as_bytes()).scan_all();
        self.report_all(&lex_errors);

        let statements: Vec<Stmt> = match Parser::new(tokens).parse() {
            Ok(statements) => statements,
            Err(errors) => {
                self.report_all(&errors);
                return None;
            }
        };

        // A script with lexical errors is never resolved or executed.
        if !lex_errors.is_empty() || !self.resolve(&statements) {
            return None;
        }

        Some(statements)
    }

    fn resolve(&mut self, statements: &[Stmt]) -> bool {
        match Resolver::new(&mut self.interpreter).resolve(statements) {
            Ok(()) => true,
            Err(errors) => {
                self.report_all(&errors);
                false
            }
        }
    }

    fn execute(&mut self, statements: &[Stmt]) -> Outcome {
        match self.interpreter.interpret(statements) {
            Ok(()) => Outcome::Ok,
            Err(e) => {
                debug!("Runtime debug: {}", e);
                self.report(&e);
                self.had_runtime_error = true;
                Outcome::RuntimeError
            }
        }
    }

    fn report_all(&mut self, errors: &[LoxError]) {
        for e in errors {
            self.report(e);
        }
    }

    fn report(&mut self, error: &LoxError) {
        if error.is_static() {
            self.had_error = true;
        }

        if let Err(e) = writeln!(self.err, "{}", error) {
            warn!("Failed to write diagnostic: {}", e);
        }
    }
}
