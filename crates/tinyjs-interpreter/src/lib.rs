//! Tree-walking interpreter for the tinyjs scripting language.
//!
//! This crate evaluates a parsed [`tinyjs_ast::Script`] directly, node by
//! node, over a chain of mutable lexical scopes. It knows nothing about
//! concrete syntax: the AST is consumed read-only.

use tinyjs_lexer::Span;
use thiserror::Error;

mod value;
mod environment;
mod eval;
mod builtins;

pub use environment::{EnvRef, Environment};
pub use eval::Interpreter;
pub use value::{BuiltinFn, NativeFn, ScriptFunction, ScriptObject, Value};

/// A runtime failure. There is deliberately no taxonomy of error kinds:
/// every evaluation error is a message plus the span it happened at, and
/// none of them are catchable from inside a script.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct Failure {
    pub message: String,
    pub span: Span,
}

impl Failure {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Result type for interpreter operations.
pub type Result<T> = std::result::Result<T, Failure>;

/// Internal unwinding channel threaded through every evaluation step.
///
/// `Return` carries the value of a `return` out of arbitrarily nested
/// blocks; it is intercepted exactly once, at the boundary of the function
/// invocation being returned from. Block and If evaluation propagate it
/// untouched via `?`.
#[derive(Debug, Clone)]
pub(crate) enum Unwind {
    Return(Value),
    Fail(Failure),
}

impl From<Failure> for Unwind {
    fn from(failure: Failure) -> Self {
        Unwind::Fail(failure)
    }
}
