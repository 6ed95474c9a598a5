use culpa::throws;

pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod output;
pub mod parser;
pub mod report;
pub mod scanner;
pub mod sema;
mod types;

pub use types::{callable, class, expr, literal, stmt};

use crate::{
    error::RuntimeError, interpreter::Interpreter, parser::Parser, scanner::Scanner,
    sema::resolver::Resolver,
};

/// Drive `source` through the full pipeline on `interpreter`: scan, parse,
/// resolve, evaluate. Each stage is skipped once an earlier one has reported
/// diagnostics; the reporter flags tell the caller what happened.
#[throws(RuntimeError)]
pub fn run(interpreter: &mut Interpreter, source: &str, scan_offset: usize) {
    let tokens = Scanner::new(source, scan_offset).scan_tokens();
    if report::had_error() {
        return;
    }

    let statements = Parser::new(tokens).parse();
    if report::had_error() {
        return;
    }

    Resolver::new(interpreter).resolve(&statements)?;
    if report::had_error() {
        return;
    }

    interpreter.interpret(&statements);
}
