//! Tree representation for queried documents.
//!
//! This module provides the dynamically-typed tree that jsonhand queries. A
//! `Node` is a mapping, a sequence, or a scalar. Mappings keep insertion order
//! so that wildcard and recursive-descent matches come back in document order.
//!
//! # Example
//!
//! ```
//! use jsonhand::document::node::{Node, Number};
//! use indexmap::IndexMap;
//!
//! let mut map = IndexMap::new();
//! map.insert("name".to_string(), Node::String("jsonhand".to_string()));
//! map.insert("version".to_string(), Node::Number(Number::Integer(1)));
//! let object = Node::Object(map);
//!
//! assert!(object.is_object());
//! assert_eq!(object.len(), Some(2));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Represents numbers (integer or float)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(fl) => write!(f, "{}", fl),
        }
    }
}

/// A node in a queried tree.
///
/// The engine only ever borrows nodes; nothing in a query mutates the tree, so
/// one tree can be shared across threads and queried concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// A null value
    Null,
    /// A boolean
    Boolean(bool),
    /// A number (integer or float)
    Number(Number),
    /// A string
    String(String),
    /// An ordered sequence of nodes
    Array(Vec<Node>),
    /// A mapping from string keys to nodes, in insertion order
    Object(IndexMap<String, Node>),
}

impl Node {
    /// Returns true if this node is a mapping.
    ///
    /// # Example
    ///
    /// ```
    /// use jsonhand::document::node::{Node, Number};
    /// use indexmap::IndexMap;
    ///
    /// assert!(Node::Object(IndexMap::new()).is_object());
    /// assert!(!Node::Number(Number::Integer(42)).is_object());
    /// ```
    pub fn is_object(&self) -> bool {
        matches!(self, Node::Object(_))
    }

    /// Returns the number of children of a container, or `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self {
            Node::Object(map) => Some(map.len()),
            Node::Array(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Returns true for null, the empty string and empty containers.
    ///
    /// Queries against an empty tree report no match without tracing.
    ///
    /// # Example
    ///
    /// ```
    /// use jsonhand::document::node::{Node, Number};
    ///
    /// assert!(Node::Null.is_empty());
    /// assert!(Node::Array(vec![]).is_empty());
    /// assert!(!Node::Number(Number::Integer(0)).is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        match self {
            Node::Null => true,
            Node::String(s) => s.is_empty(),
            Node::Array(items) => items.is_empty(),
            Node::Object(map) => map.is_empty(),
            Node::Boolean(_) | Node::Number(_) => false,
        }
    }

    /// Looks up a key in a mapping.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Looks up a position in a sequence.
    pub fn get_index(&self, index: usize) -> Option<&Node> {
        match self {
            Node::Array(items) => items.get(index),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Node::Number(Number::Integer(i)),
                None => Node::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => Node::String(s),
            Value::Array(items) => Node::Array(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => {
                Node::Object(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::String(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::String(value)
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Number(Number::Integer(value))
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::Number(Number::Float(value))
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Boolean(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_display() {
        assert_eq!(format!("{}", Number::Integer(42)), "42");
        assert_eq!(format!("{}", Number::Float(42.5)), "42.5");
    }

    #[test]
    fn test_from_json_keeps_key_order() {
        let node = Node::from(json!({"z": 1, "a": 2, "m": 3}));
        match node {
            Node::Object(map) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                assert_eq!(keys, vec!["z", "a", "m"]);
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_untagged() {
        let node: Node = serde_json::from_str(r#"{"a": [1, 2.5, "x", true, null]}"#).unwrap();
        let items = node.get("a").unwrap();
        assert_eq!(items.get_index(0), Some(&Node::Number(Number::Integer(1))));
        assert_eq!(items.get_index(1), Some(&Node::Number(Number::Float(2.5))));
        assert_eq!(items.get_index(2), Some(&Node::String("x".to_string())));
        assert_eq!(items.get_index(3), Some(&Node::Boolean(true)));
        assert_eq!(items.get_index(4), Some(&Node::Null));
    }

    #[test]
    fn test_serialize_round_trip() {
        let node = Node::from(json!({"a": [1, {"b": null}]}));
        let text = serde_json::to_string(&node).unwrap();
        assert_eq!(text, r#"{"a":[1,{"b":null}]}"#);
    }

    #[test]
    fn test_is_empty() {
        assert!(Node::from("").is_empty());
        assert!(Node::from(json!({})).is_empty());
        assert!(!Node::from(false).is_empty());
        assert!(!Node::from(json!([0])).is_empty());
    }
}
