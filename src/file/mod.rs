//! File I/O for queried documents.
//!
//! This module loads JSON, JSON Lines and YAML documents from disk or stdin,
//! transparently decompressing gzip input.

pub mod loader;
