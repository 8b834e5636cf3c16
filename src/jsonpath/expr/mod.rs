//! Sandboxed expressions for filters (`[?(…)]`) and computed indices (`[(…)]`).
//!
//! Expressions are parsed by a small grammar limited to literals, access to
//! the current node (`@`), arithmetic, comparisons, boolean connectives and
//! calls into a caller-supplied [`Scope`]. Nothing else is reachable.
//!
//! # Example
//!
//! ```
//! use jsonhand::document::Node;
//! use jsonhand::jsonpath::{evaluate, Value};
//! use serde_json::json;
//!
//! let month = Node::from(json!({"years": 2018, "month": "May"}));
//! assert_eq!(evaluate("@.years == 2018 && @.month", &month, None), Value::from("May"));
//! assert_eq!(evaluate("@.bogus.syntax(", &month, None), Value::Bool(false));
//! ```

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod value;

pub use ast::Expr;
pub use eval::Evaluator;
pub use scope::Scope;
pub use value::Value;

use crate::document::node::Node;
use crate::jsonpath::error::EvalError;

/// Parses an expression without evaluating it.
pub fn parse(source: &str) -> Result<Expr, EvalError> {
    parser::Parser::parse(source)
}

/// Evaluates a parsed expression against `current`, reporting any failure.
pub fn try_evaluate<'a>(
    expr: &Expr,
    current: &'a Node,
    scope: Option<&Scope>,
) -> Result<Value<'a>, EvalError> {
    Evaluator::new(scope).eval(expr, current)
}

/// Parses and evaluates `source` against `current`.
///
/// Any parse or evaluation error yields `false`; the error itself is only
/// logged at debug level.
pub fn evaluate<'a>(source: &str, current: &'a Node, scope: Option<&Scope>) -> Value<'a> {
    match parse(source).and_then(|expr| try_evaluate(&expr, current, scope)) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(expression = source, error = %err, "expression evaluated to false");
            Value::Bool(false)
        }
    }
}
