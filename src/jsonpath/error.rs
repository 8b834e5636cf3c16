//! Error types for path parsing and expression evaluation.
//!
//! Neither error ever escapes `find`: a failing filter or computed index only
//! prunes its own branch. They are public so callers evaluating expressions or
//! parsing bracket paths directly can see what went wrong.

use thiserror::Error;

/// Errors that can occur while parsing a bracket-notation path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Unexpected token at a specific position.
    #[error("Unexpected token '{found}' at position {position}, expected {expected}")]
    UnexpectedToken {
        position: usize,
        found: String,
        expected: String,
    },
    /// Unexpected end of input.
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: String },
    /// Invalid syntax with description.
    #[error("Invalid path syntax: {message}")]
    InvalidSyntax { message: String },
}

/// Errors raised while parsing or evaluating a filter / index expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Expression evaluation was turned off for this query.
    #[error("expression evaluation is disabled")]
    Disabled,
    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },
    #[error("key '{0}' not found")]
    MissingKey(String),
    #[error("index {0} out of range")]
    IndexOutOfRange(i64),
    #[error("unsupported operand type(s) for {op}: '{left}' and '{right}'")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("object of type '{0}' has no len()")]
    NoLength(&'static str),
    #[error("'{0}' object is not subscriptable")]
    NotSubscriptable(&'static str),
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("name '{0}' is not defined")]
    UnknownName(String),
    #[error("{name}() takes {expected} argument(s), {found} given")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
    /// Raised by caller-registered functions.
    #[error("{0}")]
    Custom(String),
}

impl EvalError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        EvalError::Syntax {
            position,
            message: message.into(),
        }
    }

    /// Builds an error for a caller-registered function to return.
    pub fn custom(message: impl Into<String>) -> Self {
        EvalError::Custom(message.into())
    }
}
