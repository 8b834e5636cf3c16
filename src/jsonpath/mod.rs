//! JSONPath query engine: normalizer, trace interpreter and expression evaluator.
//!
//! A query is first normalized into a `;`-separated token list, then traced
//! against the tree. Filters and computed indices are evaluated by a small
//! sandboxed expression language.
//!
//! # Supported Syntax
//!
//! - `$` - Root node
//! - `.field` / `['field']` - Child access
//! - `[n]` - Sequence index
//! - `[*]` or `.*` - All children (wildcard)
//! - `..field` - Recursive descent
//! - `[start:end:step]` - Slice, negative bounds count from the end
//! - `[a,b]` / `['a','b']` - Union
//! - `[(expr)]` - Computed index, e.g. `[(@.length-1)]`
//! - `[?(expr)]` - Filter, e.g. `[?(@.year == 2018)]`
//! - `.!` - Keys of a mapping
//!
//! Inside expressions `@` is the current node, `@.a.b` reads a field,
//! `@.length` is its size and `!@.key` tests that `key` is absent.
//!
//! # Examples
//!
//! ```
//! // $.data[*].year - every year
//! // $..count - every count at any depth
//! // $.data[-1:] - the last element
//! // $.data[?(@.year > 2016 && @.months.length > 2)] - filtered children
//! ```

pub mod error;
pub mod expr;
pub mod normalize;
pub mod path;
pub mod trace;

pub use error::{EvalError, PathError};
pub use expr::{evaluate, Scope, Value};
pub use normalize::normalize;
pub use path::{resolve, resolve_bracket, to_bracket_notation, PathSegment};
pub use trace::{find, FindOptions, Match, ResultMode};
