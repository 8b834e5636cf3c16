//! jsonhand: JSONPath-style queries over JSON and YAML trees.
//!
//! # Example
//!
//! ```
//! use jsonhand::document::Node;
//! use jsonhand::jsonpath::{find, FindOptions};
//! use serde_json::json;
//!
//! let tree = Node::from(json!({"store": {"book": [{"price": 8}, {"price": 12}]}}));
//! let cheap = find(&tree, "$.store.book[?(@.price < 10)]", &FindOptions::default()).unwrap();
//! assert_eq!(cheap.len(), 1);
//! ```

pub mod config;
pub mod document;
pub mod file;
pub mod jsonpath;

pub use document::Node;
pub use jsonpath::{find, normalize, FindOptions, Match, ResultMode};
