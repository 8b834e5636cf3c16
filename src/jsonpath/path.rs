//! Match paths and their bracket-notation rendering.
//!
//! A match path is the list of keys and indices leading from the root to a
//! matched node. In `Path` result mode it is rendered as `$['key'][0]`; this
//! module also parses that notation back so a rendered path can be resolved
//! against the tree again.

use serde::Serialize;
use std::fmt;

use super::error::PathError;
use crate::document::node::Node;

/// One step from a node to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A mapping key
    Key(String),
    /// A sequence position
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(idx) => write!(f, "{}", idx),
        }
    }
}

/// Renders a path in full bracket notation.
///
/// # Example
///
/// ```
/// use jsonhand::jsonpath::path::{to_bracket_notation, PathSegment};
///
/// let path = vec![PathSegment::Key("data".into()), PathSegment::Index(0)];
/// assert_eq!(to_bracket_notation(&path), "$['data'][0]");
/// ```
pub fn to_bracket_notation(path: &[PathSegment]) -> String {
    let mut out = String::from("$");
    for segment in path {
        match segment {
            PathSegment::Index(idx) => {
                out.push('[');
                out.push_str(&idx.to_string());
                out.push(']');
            }
            PathSegment::Key(key) => {
                out.push_str("['");
                for ch in key.chars() {
                    if ch == '\'' || ch == '\\' {
                        out.push('\\');
                    }
                    out.push(ch);
                }
                out.push_str("']");
            }
        }
    }
    out
}

/// Follows `path` from `root` by plain indexing.
pub fn resolve<'a>(root: &'a Node, path: &[PathSegment]) -> Option<&'a Node> {
    path.iter().try_fold(root, |node, segment| match segment {
        PathSegment::Key(key) => node.get(key),
        PathSegment::Index(idx) => node.get_index(*idx),
    })
}

/// Parses a bracket-notation path and follows it from `root`.
///
/// Returns `None` if the path does not parse or leads nowhere.
pub fn resolve_bracket<'a>(root: &'a Node, path: &str) -> Option<&'a Node> {
    let segments = BracketParser::parse(path).ok()?;
    resolve(root, &segments)
}

/// Parser for full bracket-notation paths such as `$['store']['book'][0]`.
pub struct BracketParser<'s> {
    input: &'s str,
    position: usize,
}

impl<'s> BracketParser<'s> {
    /// Creates a new parser for the given path string.
    pub fn new(input: &'s str) -> Self {
        Self { input, position: 0 }
    }

    /// Parses the path string into its segments.
    pub fn parse(input: &'s str) -> Result<Vec<PathSegment>, PathError> {
        let mut parser = BracketParser::new(input);
        parser.parse_path()
    }

    fn parse_path(&mut self) -> Result<Vec<PathSegment>, PathError> {
        let mut segments = Vec::new();

        self.skip_whitespace();
        if self.peek() != Some('$') {
            return Err(PathError::InvalidSyntax {
                message: "path must start with '$'".to_string(),
            });
        }
        self.next();

        while !self.is_eof() {
            self.skip_whitespace();
            if self.is_eof() {
                break;
            }
            segments.push(self.parse_bracket_segment()?);
        }

        Ok(segments)
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Returns the next character and advances position.
    fn next(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.next();
            } else {
                break;
            }
        }
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Expects a specific character and advances, or returns an error.
    fn expect(&mut self, expected: char) -> Result<(), PathError> {
        self.skip_whitespace();
        let pos = self.position;
        match self.next() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(PathError::UnexpectedToken {
                position: pos,
                found: ch.to_string(),
                expected: format!("'{}'", expected),
            }),
            None => Err(PathError::UnexpectedEnd {
                expected: format!("'{}'", expected),
            }),
        }
    }

    /// Parses one `['key']` or `[index]` segment.
    fn parse_bracket_segment(&mut self) -> Result<PathSegment, PathError> {
        self.expect('[')?;
        self.skip_whitespace();

        let segment = match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.next();
                PathSegment::Key(self.parse_quoted(quote)?)
            }
            Some('0'..='9') => PathSegment::Index(self.parse_index()?),
            Some(ch) => {
                return Err(PathError::UnexpectedToken {
                    position: self.position,
                    found: ch.to_string(),
                    expected: "quoted key or index".to_string(),
                })
            }
            None => {
                return Err(PathError::UnexpectedEnd {
                    expected: "quoted key or index".to_string(),
                })
            }
        };

        self.expect(']')?;
        Ok(segment)
    }

    /// Parses a quoted key body; the opening quote is already consumed.
    fn parse_quoted(&mut self, quote: char) -> Result<String, PathError> {
        let mut value = String::new();
        loop {
            match self.next() {
                Some(ch) if ch == quote => return Ok(value),
                Some('\\') => match self.next() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('\\') => value.push('\\'),
                    Some('\'') => value.push('\''),
                    Some('"') => value.push('"'),
                    Some(_) | None => {
                        return Err(PathError::InvalidSyntax {
                            message: "Invalid escape sequence".to_string(),
                        })
                    }
                },
                Some(ch) => value.push(ch),
                None => {
                    return Err(PathError::UnexpectedEnd {
                        expected: format!("closing quote '{}'", quote),
                    })
                }
            }
        }
    }

    fn parse_index(&mut self) -> Result<usize, PathError> {
        let start = self.position;
        while matches!(self.peek(), Some('0'..='9')) {
            self.next();
        }
        let digits = &self.input[start..self.position];
        digits.parse::<usize>().map_err(|_| PathError::InvalidSyntax {
            message: format!("Invalid index: {}", digits),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(k: &str) -> PathSegment {
        PathSegment::Key(k.to_string())
    }

    #[test]
    fn test_render_root() {
        assert_eq!(to_bracket_notation(&[]), "$");
    }

    #[test]
    fn test_render_mixed() {
        let path = vec![key("data"), PathSegment::Index(2), key("months")];
        assert_eq!(to_bracket_notation(&path), "$['data'][2]['months']");
    }

    #[test]
    fn test_render_escapes_quotes() {
        let path = vec![key("it's"), key(r"back\slash")];
        assert_eq!(to_bracket_notation(&path), r"$['it\'s']['back\\slash']");
    }

    #[test]
    fn test_render_digit_key_stays_quoted() {
        assert_eq!(to_bracket_notation(&[key("2")]), "$['2']");
    }

    #[test]
    fn test_parse_root() {
        assert_eq!(BracketParser::parse("$").unwrap(), vec![]);
    }

    #[test]
    fn test_parse_segments() {
        let segments = BracketParser::parse("$['store'][0][\"title\"]").unwrap();
        assert_eq!(segments, vec![key("store"), PathSegment::Index(0), key("title")]);
    }

    #[test]
    fn test_parse_whitespace_handling() {
        let segments = BracketParser::parse("$ [ 'store' ] [ 3 ]").unwrap();
        assert_eq!(segments, vec![key("store"), PathSegment::Index(3)]);
    }

    #[test]
    fn test_parse_render_inverse() {
        let path = vec![key("a'b"), PathSegment::Index(10), key("c\\d"), key("")];
        let rendered = to_bracket_notation(&path);
        assert_eq!(BracketParser::parse(&rendered).unwrap(), path);
    }

    #[test]
    fn test_parse_missing_root_fails() {
        assert!(BracketParser::parse("['store']").is_err());
    }

    #[test]
    fn test_parse_unterminated_fails() {
        assert!(matches!(
            BracketParser::parse("$['store"),
            Err(PathError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn test_parse_dot_notation_rejected() {
        assert!(matches!(
            BracketParser::parse("$.store"),
            Err(PathError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_resolve() {
        let tree = Node::from(json!({"a": [{"b": 1}, {"b": 2}]}));
        let found = resolve_bracket(&tree, "$['a'][1]['b']");
        assert_eq!(found, Some(&Node::from(2)));
        assert_eq!(resolve_bracket(&tree, "$['a'][5]"), None);
        assert_eq!(resolve(&tree, &[]), Some(&tree));
    }
}
