//! tinyjs command-line interface.

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tinyjs_interpreter::{Failure, Interpreter};
use tinyjs_parser::{parse, ParseError};

#[derive(Parser)]
#[command(name = "tinyjs")]
#[command(version = "0.1.0")]
#[command(about = "The tinyjs scripting language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a tinyjs script
    Run {
        /// Source file to run
        file: PathBuf,
        /// Log every print call to stderr before writing it
        #[arg(long)]
        trace: bool,
    },
    /// Parse a source file and display the AST
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Lex a source file and display tokens
    Lex {
        /// Source file to lex
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, trace } => run_file(&file, trace),
        Commands::Parse { file } => parse_file(&file),
        Commands::Lex { file } => lex_file(&file),
    }
}

fn read_source(path: &PathBuf) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(s) => Some(s),
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            None
        }
    }
}

/// Run a script with the tree-walking interpreter.
fn run_file(path: &PathBuf, trace: bool) -> ExitCode {
    let Some(source) = read_source(path) else {
        return ExitCode::FAILURE;
    };
    let filename = path.display().to_string();

    let script = match parse(&source) {
        Ok(script) => script,
        Err(error) => {
            report_parse_error(&filename, &source, &error);
            return ExitCode::FAILURE;
        }
    };

    let mut interpreter = Interpreter::new();
    interpreter.set_trace(trace);
    match interpreter.interpret(&script) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            report_failure(&filename, &source, &failure);
            ExitCode::FAILURE
        }
    }
}

/// Parse a source file and dump the AST.
fn parse_file(path: &PathBuf) -> ExitCode {
    let Some(source) = read_source(path) else {
        return ExitCode::FAILURE;
    };
    let filename = path.display().to_string();

    match parse(&source) {
        Ok(script) => {
            println!("{:#?}", script);
            ExitCode::SUCCESS
        }
        Err(error) => {
            report_parse_error(&filename, &source, &error);
            ExitCode::FAILURE
        }
    }
}

/// Lex a source file and dump the token stream.
fn lex_file(path: &PathBuf) -> ExitCode {
    let Some(source) = read_source(path) else {
        return ExitCode::FAILURE;
    };

    let (tokens, lex_errors) = tinyjs_lexer::Lexer::new(&source).tokenize();

    println!("Tokens ({}):", tokens.len());
    for token in &tokens {
        println!("  {:?} @ {:?}", token.kind, token.span);
    }

    if !lex_errors.is_empty() {
        println!("\nLexer errors ({}):", lex_errors.len());
        for error in &lex_errors {
            println!("  {}", error);
        }
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Report a parse error using ariadne.
fn report_parse_error(filename: &str, source: &str, error: &ParseError) {
    let span_range = match error.span() {
        Some(span) => span.start..span.end,
        // end-of-file errors point at the last byte
        None => source.len().saturating_sub(1)..source.len(),
    };

    Report::build(ReportKind::Error, filename, span_range.start)
        .with_message("parse error")
        .with_label(
            Label::new((filename, span_range))
                .with_message(error.to_string())
                .with_color(Color::Red),
        )
        .finish()
        .print((filename, Source::from(source)))
        .unwrap();
}

/// Report a runtime failure using ariadne.
fn report_failure(filename: &str, source: &str, failure: &Failure) {
    let span_range = failure.span.start..failure.span.end;

    Report::build(ReportKind::Error, filename, span_range.start)
        .with_message("runtime error")
        .with_label(
            Label::new((filename, span_range))
                .with_message(failure.to_string())
                .with_color(Color::Red),
        )
        .finish()
        .print((filename, Source::from(source)))
        .unwrap();
}
