//! The document tree queried by jsonhand.

pub mod node;

pub use node::{Node, Number};
