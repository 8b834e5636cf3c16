//! Trace interpreter: walks the tree along a normalized token list.
//!
//! Each token either descends into a child (key, index), fans out over several
//! children (`*`, filters, slices, unions), or re-dispatches a computed token
//! (`(expr)`). Matches are collected depth-first in document order.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::expr::{self, Scope};
use super::normalize::normalize;
use super::path::{to_bracket_notation, PathSegment};
use crate::document::node::Node;

/// What each match is reported as.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ResultMode {
    /// The matched node itself
    #[default]
    Value,
    /// The list of keys and indices leading to the match
    #[serde(rename = "ipath")]
    #[value(name = "ipath")]
    IndexPath,
    /// The bracket-notation path of the match, e.g. `$['data'][0]`
    Path,
}

/// Options for a single [`find`] call.
#[derive(Debug, Clone, Copy)]
pub struct FindOptions<'f> {
    pub mode: ResultMode,
    /// 0 is quiet, 1 logs each trace step, 2 also logs per-child decisions.
    pub debug: u8,
    /// When false, `(expr)` and `?(expr)` tokens match nothing.
    pub allow_eval: bool,
    /// Functions and values visible to expressions.
    pub scope: Option<&'f Scope>,
}

impl Default for FindOptions<'_> {
    fn default() -> Self {
        Self {
            mode: ResultMode::Value,
            debug: 0,
            allow_eval: true,
            scope: None,
        }
    }
}

impl<'f> FindOptions<'f> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: ResultMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn debug(mut self, level: u8) -> Self {
        self.debug = level;
        self
    }

    pub fn allow_eval(mut self, allow: bool) -> Self {
        self.allow_eval = allow;
        self
    }

    pub fn scope(mut self, scope: &'f Scope) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// A single match, shaped by the [`ResultMode`] of the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Match<'a> {
    /// The matched node; owned only when the match is a key enumerated by `!`.
    Value(Cow<'a, Node>),
    IndexPath(Vec<PathSegment>),
    Path(String),
}

impl<'a> Match<'a> {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Match::Value(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_index_path(&self) -> Option<&[PathSegment]> {
        match self {
            Match::IndexPath(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&str> {
        match self {
            Match::Path(path) => Some(path),
            _ => None,
        }
    }

    /// Converts the match into an owned node; paths become strings or arrays.
    pub fn into_node(self) -> Node {
        match self {
            Match::Value(node) => node.into_owned(),
            Match::IndexPath(path) => Node::Array(
                path.into_iter()
                    .map(|segment| match segment {
                        PathSegment::Key(key) => Node::String(key),
                        PathSegment::Index(idx) => Node::from(idx as i64),
                    })
                    .collect(),
            ),
            Match::Path(path) => Node::String(path),
        }
    }
}

/// The thing a token is applied to: a node, or a key enumerated by `!`.
#[derive(Debug, Clone, Copy)]
enum Subject<'a> {
    Node(&'a Node),
    Key(&'a str),
}

impl<'a> Subject<'a> {
    fn node(self) -> Option<&'a Node> {
        match self {
            Subject::Node(node) => Some(node),
            Subject::Key(_) => None,
        }
    }
}

/// Runs a path query against `tree`.
///
/// Returns `None` when nothing matches, when `expr` is empty, or when the tree
/// is empty (null, `""`, `{}` or `[]`). A returned list is never empty.
///
/// # Example
///
/// ```
/// use jsonhand::document::Node;
/// use jsonhand::jsonpath::{find, FindOptions, ResultMode};
/// use serde_json::json;
///
/// let tree = Node::from(json!({"data": [{"year": 2016}, {"year": 2017}]}));
///
/// let years = find(&tree, "$.data[*].year", &FindOptions::default()).unwrap();
/// assert_eq!(years.len(), 2);
///
/// let paths = find(&tree, "$..year", &FindOptions::new().mode(ResultMode::Path)).unwrap();
/// assert_eq!(paths[0].as_path(), Some("$['data'][0]['year']"));
///
/// assert!(find(&tree, "$.missing", &FindOptions::default()).is_none());
/// ```
pub fn find<'a>(
    tree: &'a Node,
    expr: &str,
    options: &FindOptions<'_>,
) -> Option<Vec<Match<'a>>> {
    if expr.is_empty() || tree.is_empty() {
        return None;
    }

    let normalized = normalize(expr);
    let body = if normalized == "$" {
        ""
    } else {
        normalized.strip_prefix("$;").unwrap_or(&normalized)
    };
    let tokens: Vec<&str> = if body.is_empty() {
        Vec::new()
    } else {
        body.split(';').collect()
    };
    if options.debug > 0 {
        tracing::debug!(expression = expr, normalized = %normalized, "tracing query");
    }

    let mut tracer = Tracer {
        options,
        results: Vec::new(),
        path: Vec::new(),
    };
    tracer.trace(&tokens, Subject::Node(tree));

    if tracer.results.is_empty() {
        None
    } else {
        Some(tracer.results)
    }
}

struct Tracer<'a, 'o> {
    options: &'o FindOptions<'o>,
    results: Vec<Match<'a>>,
    path: Vec<PathSegment>,
}

impl<'a> Tracer<'a, '_> {
    fn trace(&mut self, tokens: &[&str], subject: Subject<'a>) {
        match tokens {
            [] | [""] => self.store(subject),
            [head, rest @ ..] => {
                if self.options.debug > 0 {
                    tracing::debug!(
                        token = *head,
                        path = %to_bracket_notation(&self.path),
                        "trace"
                    );
                }
                self.dispatch(head, rest, subject);
            }
        }
    }

    fn store(&mut self, subject: Subject<'a>) {
        let found = match self.options.mode {
            ResultMode::Value => Match::Value(match subject {
                Subject::Node(node) => Cow::Borrowed(node),
                Subject::Key(key) => Cow::Owned(Node::String(key.to_string())),
            }),
            ResultMode::IndexPath => Match::IndexPath(self.path.clone()),
            ResultMode::Path => Match::Path(to_bracket_notation(&self.path)),
        };
        self.results.push(found);
    }

    /// Applies one token to `subject`, handing `rest` to whatever it selects.
    fn dispatch(&mut self, head: &str, rest: &[&str], subject: Subject<'a>) {
        match head {
            "*" => {
                if let Some(node) = subject.node() {
                    for (segment, child) in children(node) {
                        self.descend(segment, child, rest);
                    }
                }
                return;
            }
            ".." => {
                self.recursive_descent(rest, subject);
                return;
            }
            "!" => {
                if let Some(Node::Object(map)) = subject.node() {
                    for key in map.keys() {
                        self.trace(rest, Subject::Key(key));
                    }
                }
                return;
            }
            _ => {}
        }

        match subject.node() {
            Some(Node::Object(map)) => {
                if let Some(child) = map.get(head) {
                    self.descend(PathSegment::Key(head.to_string()), child, rest);
                    return;
                }
            }
            Some(Node::Array(items)) if is_decimal(head) => {
                if let Some((idx, child)) = head
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| items.get(idx).map(|child| (idx, child)))
                {
                    self.descend(PathSegment::Index(idx), child, rest);
                }
                return;
            }
            _ => {}
        }

        if head.starts_with("?(") && head.ends_with(')') {
            self.filter(head, rest, subject);
        } else if head.starts_with('(') && head.ends_with(')') {
            self.computed(head, rest, subject);
        } else if let Some(bounds) = SliceBounds::parse(head) {
            self.slice(bounds, rest, subject);
        } else if head.contains(',') {
            for piece in split_union(head) {
                if self.options.debug > 1 {
                    tracing::trace!(piece, "union member");
                }
                self.dispatch(piece, rest, subject);
            }
        }
    }

    fn descend(&mut self, segment: PathSegment, child: &'a Node, rest: &[&str]) {
        self.path.push(segment);
        self.trace(rest, Subject::Node(child));
        self.path.pop();
    }

    /// `..`: match `rest` here, then at every depth below.
    fn recursive_descent(&mut self, rest: &[&str], subject: Subject<'a>) {
        self.trace(rest, subject);
        if let Some(node) = subject.node() {
            for (segment, child) in children(node) {
                self.path.push(segment);
                self.recursive_descent(rest, Subject::Node(child));
                self.path.pop();
            }
        }
    }

    /// `(expr)`: evaluates against the subject and retries with the result as the token.
    fn computed(&mut self, head: &str, rest: &[&str], subject: Subject<'a>) {
        if !self.options.allow_eval {
            if self.options.debug > 0 {
                tracing::debug!(token = head, "expression evaluation disabled");
            }
            return;
        }

        let key_node;
        let node = match subject {
            Subject::Node(node) => node,
            Subject::Key(key) => {
                key_node = Node::String(key.to_string());
                &key_node
            }
        };
        let token = expr::parse(head)
            .and_then(|parsed| expr::try_evaluate(&parsed, node, self.options.scope))
            .map(|value| value.to_token());

        match token {
            Ok(Some(token)) if !token.starts_with('(') && !token.starts_with("?(") => {
                if self.options.debug > 1 {
                    tracing::trace!(expression = head, token = %token, "computed index");
                }
                self.dispatch(&token, rest, subject);
            }
            Ok(_) => {
                if self.options.debug > 0 {
                    tracing::debug!(expression = head, "computed index is not a usable token");
                }
            }
            Err(err) => {
                if self.options.debug > 0 {
                    tracing::debug!(expression = head, error = %err, "computed index failed");
                }
            }
        }
    }

    /// `?(expr)`: keeps the children for which `expr` is truthy.
    fn filter(&mut self, head: &str, rest: &[&str], subject: Subject<'a>) {
        if !self.options.allow_eval {
            if self.options.debug > 0 {
                tracing::debug!(token = head, "expression evaluation disabled");
            }
            return;
        }
        let Some(node) = subject.node() else {
            return;
        };

        let source = &head[2..head.len() - 1];
        let parsed = match expr::parse(source) {
            Ok(parsed) => parsed,
            Err(err) => {
                if self.options.debug > 0 {
                    tracing::debug!(expression = source, error = %err, "filter does not parse");
                }
                return;
            }
        };

        for (segment, child) in children(node) {
            let keep = match expr::try_evaluate(&parsed, child, self.options.scope) {
                Ok(value) => value.is_truthy(),
                Err(err) => {
                    if self.options.debug > 1 {
                        tracing::trace!(child = %segment, error = %err, "filter failed");
                    }
                    false
                }
            };
            if keep {
                self.descend(segment, child, rest);
            }
        }
    }

    fn slice(&mut self, bounds: SliceBounds, rest: &[&str], subject: Subject<'a>) {
        let Some(node) = subject.node() else {
            return;
        };
        let Some(len) = node.len() else {
            return;
        };

        let Some(indices) = bounds.indices(len) else {
            if self.options.debug > 0 {
                tracing::debug!(?bounds, "slice step is zero");
            }
            return;
        };
        for idx in indices {
            match node {
                Node::Array(items) => {
                    if let Some(child) = items.get(idx) {
                        self.descend(PathSegment::Index(idx), child, rest);
                    }
                }
                Node::Object(map) => {
                    let key = idx.to_string();
                    if let Some(child) = map.get(&key) {
                        self.descend(PathSegment::Key(key), child, rest);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Children of a container in iteration order: keys of a mapping, positions of a sequence.
fn children(node: &Node) -> impl Iterator<Item = (PathSegment, &Node)> {
    let (map, items) = match node {
        Node::Object(map) => (Some(map), None),
        Node::Array(items) => (None, Some(items)),
        _ => (None, None),
    };
    map.into_iter()
        .flatten()
        .map(|(key, child)| (PathSegment::Key(key.clone()), child))
        .chain(
            items
                .into_iter()
                .flat_map(|items| items.iter().enumerate())
                .map(|(idx, child)| (PathSegment::Index(idx), child)),
        )
}

/// ASCII digits only; a leading sign is not an index.
fn is_decimal(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Splits a union token on commas, dropping a quote on either side of each comma.
fn split_union(token: &str) -> impl Iterator<Item = &str> {
    let pieces: Vec<&str> = token.split(',').collect();
    let last = pieces.len() - 1;
    pieces.into_iter().enumerate().map(move |(i, piece)| {
        let piece = if i > 0 {
            piece.strip_prefix('\'').unwrap_or(piece)
        } else {
            piece
        };
        if i < last {
            piece.strip_suffix('\'').unwrap_or(piece)
        } else {
            piece
        }
    })
}

/// The three optional parts of a `start:end:step` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SliceBounds {
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
}

impl SliceBounds {
    /// Parses `start:end` or `start:end:step`, each part `-?[0-9]*`.
    fn parse(token: &str) -> Option<Self> {
        let parts: Vec<&str> = token.split(':').collect();
        if !(2..=3).contains(&parts.len()) {
            return None;
        }
        let mut bounds = parts.iter().map(|part| parse_bound(part));
        let start = bounds.next()??;
        let end = bounds.next()??;
        let step = match bounds.next() {
            Some(step) => step?,
            None => None,
        };
        Some(Self { start, end, step })
    }

    /// Resolves the bounds against `len` and yields `range(start, end, step)`.
    ///
    /// Returns `None` for a zero step.
    fn indices(self, len: usize) -> Option<impl Iterator<Item = usize>> {
        let len = i64::try_from(len).ok()?;
        let clamp = |bound: i64| {
            if bound < 0 {
                (bound + len).max(0)
            } else {
                bound.min(len)
            }
        };
        let start = clamp(self.start.unwrap_or(0));
        let end = clamp(self.end.unwrap_or(len));
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return None;
        }

        let mut current = start;
        Some(
            std::iter::from_fn(move || {
                let in_range = if step > 0 { current < end } else { current > end };
                if !in_range {
                    return None;
                }
                let idx = current;
                current += step;
                Some(idx)
            })
            .filter_map(|idx| usize::try_from(idx).ok()),
        )
    }
}

/// Parses one slice part. `Some(None)` is an omitted part, `None` is not a bound.
fn parse_bound(part: &str) -> Option<Option<i64>> {
    let digits = part.strip_prefix('-').unwrap_or(part);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.is_empty() {
        // a lone "-" has no value
        return if part.is_empty() { Some(None) } else { None };
    }
    part.parse::<i64>().ok().map(Some)
}
