//! Diagnostic reporter shared by every pipeline stage.
//!
//! Scan, parse and resolution errors flip the sticky `had_error` flag; the
//! driver checks it between stages and refuses to go further. Runtime errors
//! flip `had_runtime_error` instead. The flags are cleared between REPL lines
//! and persist for the whole of a script run.

use {
    crate::{
        error::RuntimeError,
        scanner::{Token, TokenKind},
    },
    std::cell::Cell,
};

thread_local! {
    static HAD_ERROR: Cell<bool> = const { Cell::new(false) };
    static HAD_RUNTIME_ERROR: Cell<bool> = const { Cell::new(false) };
}

pub fn had_error() -> bool {
    HAD_ERROR.with(Cell::get)
}

pub fn had_runtime_error() -> bool {
    HAD_RUNTIME_ERROR.with(Cell::get)
}

pub fn clear() {
    HAD_ERROR.with(|f| f.set(false));
    HAD_RUNTIME_ERROR.with(|f| f.set(false));
}

/// Report a static diagnostic with no token at hand (scanner).
pub fn error_line(line: usize, message: &str) {
    report(line, "", message);
}

/// Report a static diagnostic at a token (parser, resolver).
pub fn error_token(token: &Token, message: &str) {
    if token.kind == TokenKind::Eof {
        report(token.position.line, " at end", message);
    } else {
        report(
            token.position.line,
            &format!(" at '{}'", token.lexeme),
            message,
        );
    }
}

fn report(line: usize, location: &str, message: &str) {
    eprintln!("{}", format_report(line, location, message));
    HAD_ERROR.with(|f| f.set(true));
}

pub fn format_report(line: usize, location: &str, message: &str) -> String {
    format!("[line {line}] Error{location}: {message}")
}

/// Report an error that unwound out of the interpreter.
pub fn runtime_error(error: &RuntimeError) {
    eprintln!("{}", format_runtime_error(error));
    HAD_RUNTIME_ERROR.with(|f| f.set(true));
}

pub fn format_runtime_error(error: &RuntimeError) -> String {
    match error.token() {
        Some(token) => format!("{error}\n[line {}]", token.position.line),
        None => format!("{error}"),
    }
}
