//! Caller-supplied functions and values visible to expressions.
//!
//! Filters can call helpers by name (`?(is_recent(@.year))`) and refer to
//! named constants (`?(@.count > threshold)`). Only what the caller registers
//! here is reachable; there is no ambient scope.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::value::Value;
use crate::document::node::Node;
use crate::jsonpath::error::EvalError;

/// A function callable from an expression.
pub type Function =
    dyn for<'v> Fn(&[Value<'v>]) -> Result<Value<'static>, EvalError> + Send + Sync;

/// A read-only registry of named functions and values.
///
/// # Example
///
/// ```
/// use jsonhand::jsonpath::{Scope, Value};
///
/// let mut scope = Scope::new();
/// scope.insert_fn("double", |args: &[Value<'_>]| match args {
///     [Value::Int(i)] => Ok(Value::Int(i * 2)),
///     _ => Err(jsonhand::jsonpath::EvalError::custom("double() expects one int")),
/// });
/// scope.insert_value("threshold", 10_i64);
/// assert!(scope.function("double").is_some());
/// ```
#[derive(Clone, Default)]
pub struct Scope {
    functions: HashMap<String, Arc<Function>>,
    values: HashMap<String, Node>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function under `name`, replacing any previous one.
    pub fn insert_fn<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: for<'v> Fn(&[Value<'v>]) -> Result<Value<'static>, EvalError> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    /// Registers a constant under `name`, replacing any previous one.
    pub fn insert_value(&mut self, name: impl Into<String>, value: impl Into<Node>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name).map(Arc::as_ref)
    }

    pub fn value(&self, name: &str) -> Option<&Node> {
        self.values.get(name)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<&String> = self.functions.keys().collect();
        functions.sort();
        let mut values: Vec<&String> = self.values.keys().collect();
        values.sort();
        f.debug_struct("Scope")
            .field("functions", &functions)
            .field("values", &values)
            .finish()
    }
}
