use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use loxwalk::ast_printer::AstPrinter;
use loxwalk::error::LoxError;
use loxwalk::interpreter::Interpreter;
use loxwalk::parser::Parser;
use loxwalk::scanner::Scanner;
use loxwalk::session::{Outcome, Session};

/// Input data was incorrect (lexical, syntax or static error).
const EXIT_DATA_ERR: i32 = 65;
/// Internal software error (uncaught runtime error).
const EXIT_SOFTWARE: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language tree-walking interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses a file as a single expression and prints its AST
    Parse {
        filename: PathBuf,

        /// Parse the file as a whole program and print the statements as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluates a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive prompt
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    let source = String::from_utf8(buf)
        .map_err(LoxError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?;

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'loxwalk::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("loxwalk::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn report(errors: &[LoxError]) {
    for e in errors {
        eprintln!("{}", e);
    }
}

fn tokenize(source: &str) {
    let mut tokenized = true;

    for token in Scanner::new(source.as_bytes()) {
        match token {
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_DATA_ERR);
        process::exit(EXIT_DATA_ERR);
    }
}

fn parse(source: &str, json: bool) -> Result<()> {
    let (tokens, lex_errors) = Scanner::new(source.as_bytes()).scan_all();
    report(&lex_errors);

    let mut parser = Parser::new(tokens);

    if json {
        match parser.parse() {
            Ok(statements) if lex_errors.is_empty() => {
                let rendered = serde_json::to_string_pretty(&statements)
                    .context("Failed to serialize the AST")?;
                println!("{}", rendered);
                return Ok(());
            }
            Ok(_) => {}
            Err(errors) => report(&errors),
        }
    } else {
        match parser.parse_expression() {
            Ok(expr) if lex_errors.is_empty() => {
                println!("{}", AstPrinter::print(&expr));
                return Ok(());
            }
            Ok(_) => {}
            Err(errors) => report(&errors),
        }
    }

    process::exit(EXIT_DATA_ERR);
}

fn evaluate(source: &str) {
    let (tokens, lex_errors) = Scanner::new(source.as_bytes()).scan_all();
    report(&lex_errors);

    let expr = match Parser::new(tokens).parse_expression() {
        Ok(expr) if lex_errors.is_empty() => expr,
        Ok(_) => process::exit(EXIT_DATA_ERR),
        Err(errors) => {
            report(&errors);
            process::exit(EXIT_DATA_ERR);
        }
    };

    let mut interpreter = Interpreter::new();

    match interpreter.evaluate(&expr) {
        Ok(value) => println!("{}", value),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(EXIT_SOFTWARE);
        }
    }
}

fn run(source: &str) {
    let mut session = Session::new();

    match session.run(source) {
        Outcome::Ok => info!("Program executed successfully"),
        Outcome::StaticError => process::exit(EXIT_DATA_ERR),
        Outcome::RuntimeError => process::exit(EXIT_SOFTWARE),
    }
}

fn repl() -> Result<()> {
    let mut session = Session::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush the prompt")?;

        let Some(line) = lines.next() else {
            break; // Ctrl-D
        };
        let line = line.context("Failed to read from stdin")?;

        let outcome = session.run_line(&line);
        debug!("REPL line outcome: {:?}", outcome);

        // Report, but keep the prompt alive.
        session.reset_errors();
    }

    println!();
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename } => tokenize(&read_file(filename)?),
        Commands::Parse { filename, json } => parse(&read_file(filename)?, json)?,
        Commands::Evaluate { filename } => evaluate(&read_file(filename)?),
        Commands::Run { filename } => run(&read_file(filename)?),
        Commands::Repl => repl()?,
    }

    Ok(())
}
