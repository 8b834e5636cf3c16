//! Values produced while evaluating an expression.

use indexmap::IndexMap;
use std::borrow::Cow;

use crate::document::node::{Node, Number};

/// A value in an expression.
///
/// Containers and strings borrow from the queried tree where they can, so
/// filtering a large subtree does not copy it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Cow<'a, str>),
    Array(Cow<'a, [Node]>),
    Object(Cow<'a, IndexMap<String, Node>>),
}

impl<'a> Value<'a> {
    /// Borrows a tree node as a value.
    pub fn from_node(node: &'a Node) -> Self {
        match node {
            Node::Null => Value::Null,
            Node::Boolean(b) => Value::Bool(*b),
            Node::Number(Number::Integer(i)) => Value::Int(*i),
            Node::Number(Number::Float(f)) => Value::Float(*f),
            Node::String(s) => Value::Str(Cow::Borrowed(s)),
            Node::Array(items) => Value::Array(Cow::Borrowed(items)),
            Node::Object(map) => Value::Object(Cow::Borrowed(map)),
        }
    }

    /// Takes ownership of a tree node as a value.
    pub fn from_owned_node(node: Node) -> Value<'static> {
        match node {
            Node::Null => Value::Null,
            Node::Boolean(b) => Value::Bool(b),
            Node::Number(Number::Integer(i)) => Value::Int(i),
            Node::Number(Number::Float(f)) => Value::Float(f),
            Node::String(s) => Value::Str(Cow::Owned(s)),
            Node::Array(items) => Value::Array(Cow::Owned(items)),
            Node::Object(map) => Value::Object(Cow::Owned(map)),
        }
    }

    /// Detaches the value from the tree it borrows from.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Null => Value::Null,
            Value::Bool(b) => Value::Bool(b),
            Value::Int(i) => Value::Int(i),
            Value::Float(f) => Value::Float(f),
            Value::Str(s) => Value::Str(Cow::Owned(s.into_owned())),
            Value::Array(items) => Value::Array(Cow::Owned(items.into_owned())),
            Value::Object(map) => Value::Object(Cow::Owned(map.into_owned())),
        }
    }

    /// Converts the value back into a tree node.
    pub fn into_node(self) -> Node {
        match self {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Boolean(b),
            Value::Int(i) => Node::Number(Number::Integer(i)),
            Value::Float(f) => Node::Number(Number::Float(f)),
            Value::Str(s) => Node::String(s.into_owned()),
            Value::Array(items) => Node::Array(items.into_owned()),
            Value::Object(map) => Node::Object(map.into_owned()),
        }
    }

    /// Truthiness: null, false, zero, and empty strings or containers are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Array(_) => "list",
            Value::Object(_) => "dict",
        }
    }

    /// Renders a computed index as the path token it stands for.
    ///
    /// Containers have no token form and yield `None`.
    pub fn to_token(&self) -> Option<String> {
        match self {
            Value::Null => Some("None".to_string()),
            Value::Bool(true) => Some("True".to_string()),
            Value::Bool(false) => Some("False".to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(float_token(*f)),
            Value::Str(s) => Some(s.to_string()),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// Renders a float the way `repr` does: shortest round-trip digits, fixed
/// notation for exponents in `-4..16` (always with a fractional part), and
/// `1e+16` / `1e-05` style otherwise.
fn float_token(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:e}", f);
    let split = scientific
        .split_once('e')
        .and_then(|(mantissa, exp)| Some((mantissa, exp.parse::<i32>().ok()?)));
    match split {
        Some((mantissa, exp)) if !(-4..16).contains(&exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        _ => {
            let fixed = f.to_string();
            if fixed.contains('.') {
                fixed
            } else {
                format!("{}.0", fixed)
            }
        }
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value<'_> {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value<'_> {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value<'_> {
    fn from(value: String) -> Self {
        Value::Str(Cow::Owned(value))
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::Str(Cow::Borrowed(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::Int(-1).is_truthy());

        let empty = Node::from(json!([]));
        assert!(!Value::from_node(&empty).is_truthy());
    }

    #[test]
    fn test_to_token() {
        assert_eq!(Value::Int(3).to_token().as_deref(), Some("3"));
        assert_eq!(Value::Float(2.0).to_token().as_deref(), Some("2.0"));
        assert_eq!(Value::Float(2.5).to_token().as_deref(), Some("2.5"));
        assert_eq!(Value::Float(1e16).to_token().as_deref(), Some("1e+16"));
        assert_eq!(Value::Float(1.5e16).to_token().as_deref(), Some("1.5e+16"));
        assert_eq!(Value::Float(1e15).to_token().as_deref(), Some("1000000000000000.0"));
        assert_eq!(Value::Float(0.0001).to_token().as_deref(), Some("0.0001"));
        assert_eq!(Value::Float(0.00001).to_token().as_deref(), Some("1e-05"));
        assert_eq!(Value::Float(-0.0).to_token().as_deref(), Some("-0.0"));
        assert_eq!(Value::Float(f64::INFINITY).to_token().as_deref(), Some("inf"));
        assert_eq!(Value::from("name").to_token().as_deref(), Some("name"));
        assert_eq!(Value::Bool(false).to_token().as_deref(), Some("False"));
        assert_eq!(Value::Array(Cow::Owned(vec![])).to_token(), None);
    }

    #[test]
    fn test_node_round_trip() {
        let node = Node::from(json!({"a": [1, 2.5, "x"]}));
        let value = Value::from_node(&node).into_owned();
        assert_eq!(value.into_node(), node);
    }
}
