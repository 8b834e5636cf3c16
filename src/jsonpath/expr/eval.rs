//! Tree-walking evaluator for parsed expressions.
//!
//! Arithmetic, comparison and truthiness follow the usual dynamic-language
//! rules: booleans count as 0 and 1 in arithmetic, `/` always yields a float,
//! `//` and `%` round toward negative infinity, and `and`/`or` return one of
//! their operands rather than a bare boolean.

use std::borrow::Cow;
use std::cmp::Ordering;

use super::ast::{BinaryOp, CompareOp, Expr, Literal, UnaryOp};
use super::scope::Scope;
use super::value::Value;
use crate::document::node::Node;
use crate::jsonpath::error::EvalError;

/// Evaluates expressions against a current node (`@`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator<'s> {
    scope: Option<&'s Scope>,
}

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value<'_>) -> Option<Num> {
        match value {
            Value::Bool(b) => Some(Num::Int(i64::from(*b))),
            Value::Int(i) => Some(Num::Int(*i)),
            Value::Float(f) => Some(Num::Float(*f)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

impl<'s> Evaluator<'s> {
    pub fn new(scope: Option<&'s Scope>) -> Self {
        Self { scope }
    }

    pub fn eval<'a>(&self, expr: &Expr, current: &'a Node) -> Result<Value<'a>, EvalError> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Null => Value::Null,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(i) => Value::Int(*i),
                Literal::Float(f) => Value::Float(*f),
                Literal::Str(s) => Value::Str(Cow::Owned(s.clone())),
            }),
            Expr::Current(segments) => walk(current, segments).map(Value::from_node),
            Expr::Length(segments) => length(&Value::from_node(walk(current, segments)?)),
            Expr::NotMember { parent, key } => {
                let parent = Value::from_node(walk(current, parent)?);
                let key = Value::Str(Cow::Borrowed(key.as_str()));
                Ok(Value::Bool(!contains(&parent, &key)?))
            }
            Expr::Name(name) => self
                .scope
                .and_then(|scope| scope.value(name))
                .map(|node| Value::from_owned_node(node.clone()))
                .ok_or_else(|| EvalError::UnknownName(name.clone())),
            Expr::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, current))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(name, &args)
            }
            Expr::Subscript { target, index } => {
                let target = self.eval(target, current)?;
                let index = self.eval(index, current)?;
                subscript(target, &index)
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, current)?;
                unary(*op, &value)
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, current)?;
                let right = self.eval(right, current)?;
                binary(*op, &left, &right)
            }
            Expr::Compare { first, rest } => {
                let mut left = self.eval(first, current)?;
                for (op, operand) in rest {
                    let right = self.eval(operand, current)?;
                    if !compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::And(left, right) => {
                let left = self.eval(left, current)?;
                if left.is_truthy() {
                    self.eval(right, current)
                } else {
                    Ok(left)
                }
            }
            Expr::Or(left, right) => {
                let left = self.eval(left, current)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval(right, current)
                }
            }
        }
    }

    /// Calls a registered function, falling back to the `len` builtin.
    fn call<'a>(&self, name: &str, args: &[Value<'a>]) -> Result<Value<'a>, EvalError> {
        if let Some(function) = self.scope.and_then(|scope| scope.function(name)) {
            return function(args);
        }
        match name {
            "len" => match args {
                [value] => length(value),
                _ => Err(EvalError::Arity {
                    name: name.to_string(),
                    expected: 1,
                    found: args.len(),
                }),
            },
            _ => Err(EvalError::UnknownName(name.to_string())),
        }
    }
}

/// Follows dotted segments from the current node.
fn walk<'a>(current: &'a Node, segments: &[String]) -> Result<&'a Node, EvalError> {
    segments.iter().try_fold(current, |node, segment| match node {
        Node::Object(map) => map
            .get(segment)
            .ok_or_else(|| EvalError::MissingKey(segment.clone())),
        Node::Array(items) => {
            let index = segment
                .parse::<usize>()
                .map_err(|_| EvalError::MissingKey(segment.clone()))?;
            items
                .get(index)
                .ok_or(EvalError::IndexOutOfRange(index as i64))
        }
        other => Err(EvalError::NotSubscriptable(
            Value::from_node(other).type_name(),
        )),
    })
}

fn length<'a>(value: &Value<'_>) -> Result<Value<'a>, EvalError> {
    let len = match value {
        Value::Str(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => return Err(EvalError::NoLength(other.type_name())),
    };
    i64::try_from(len)
        .map(Value::Int)
        .map_err(|_| EvalError::Overflow)
}

fn unary<'a>(op: UnaryOp, value: &Value<'_>) -> Result<Value<'a>, EvalError> {
    if op == UnaryOp::Not {
        return Ok(Value::Bool(!value.is_truthy()));
    }
    let symbol = if op == UnaryOp::Neg { "unary -" } else { "unary +" };
    match (op, Num::of(value)) {
        (UnaryOp::Neg, Some(Num::Int(i))) => {
            i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow)
        }
        (UnaryOp::Neg, Some(Num::Float(f))) => Ok(Value::Float(-f)),
        (_, Some(Num::Int(i))) => Ok(Value::Int(i)),
        (_, Some(Num::Float(f))) => Ok(Value::Float(f)),
        (_, None) => Err(EvalError::TypeMismatch {
            op: symbol,
            left: value.type_name(),
            right: value.type_name(),
        }),
    }
}

fn binary<'a>(op: BinaryOp, left: &Value<'_>, right: &Value<'_>) -> Result<Value<'a>, EvalError> {
    let mismatch = || EvalError::TypeMismatch {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    };

    match (Num::of(left), Num::of(right)) {
        (Some(a), Some(b)) => arithmetic(op, a, b),
        _ => match (op, left, right) {
            (BinaryOp::Add, Value::Str(a), Value::Str(b)) => {
                Ok(Value::Str(Cow::Owned(format!("{}{}", a, b))))
            }
            (BinaryOp::Add, Value::Array(a), Value::Array(b)) => {
                let mut items = a.to_vec();
                items.extend(b.iter().cloned());
                Ok(Value::Array(Cow::Owned(items)))
            }
            (BinaryOp::Mul, Value::Str(s), times) | (BinaryOp::Mul, times, Value::Str(s)) => {
                match Num::of(times) {
                    Some(Num::Int(n)) => {
                        repeated_len(s.len(), n)?;
                        Ok(Value::Str(Cow::Owned(s.repeat(repeat_count(n)))))
                    }
                    _ => Err(mismatch()),
                }
            }
            (BinaryOp::Mul, Value::Array(items), times)
            | (BinaryOp::Mul, times, Value::Array(items)) => match Num::of(times) {
                Some(Num::Int(n)) => {
                    let count = repeated_len(items.len(), n)?;
                    Ok(Value::Array(Cow::Owned(
                        items.iter().cycle().take(count).cloned().collect(),
                    )))
                }
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },
    }
}

/// Longest string (in bytes) or list `*` may build.
const MAX_REPEAT_LEN: usize = 1 << 20;

fn repeat_count(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}

/// Length of `len` items repeated `n` times, refusing results past [`MAX_REPEAT_LEN`].
fn repeated_len(len: usize, n: i64) -> Result<usize, EvalError> {
    len.checked_mul(repeat_count(n))
        .filter(|&total| total <= MAX_REPEAT_LEN)
        .ok_or(EvalError::Overflow)
}

fn arithmetic<'a>(op: BinaryOp, a: Num, b: Num) -> Result<Value<'a>, EvalError> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => int_arithmetic(op, x, y),
        _ => float_arithmetic(op, a.as_f64(), b.as_f64()),
    }
}

fn int_arithmetic<'a>(op: BinaryOp, x: i64, y: i64) -> Result<Value<'a>, EvalError> {
    let result = match op {
        BinaryOp::Add => x.checked_add(y),
        BinaryOp::Sub => x.checked_sub(y),
        BinaryOp::Mul => x.checked_mul(y),
        BinaryOp::Div => return float_arithmetic(op, x as f64, y as f64),
        BinaryOp::FloorDiv | BinaryOp::Mod if y == 0 => return Err(EvalError::DivisionByZero),
        BinaryOp::FloorDiv => x.checked_div(y).map(|q| {
            if x % y != 0 && ((x < 0) != (y < 0)) {
                q - 1
            } else {
                q
            }
        }),
        BinaryOp::Mod => x.checked_rem(y).map(|r| {
            if r != 0 && ((r < 0) != (y < 0)) {
                r + y
            } else {
                r
            }
        }),
    };
    result.map(Value::Int).ok_or(EvalError::Overflow)
}

fn float_arithmetic<'a>(op: BinaryOp, x: f64, y: f64) -> Result<Value<'a>, EvalError> {
    if matches!(op, BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod) && y == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => x / y,
        BinaryOp::FloorDiv => (x / y).floor(),
        BinaryOp::Mod => {
            let r = x % y;
            if r != 0.0 && ((r < 0.0) != (y < 0.0)) {
                r + y
            } else {
                r
            }
        }
    };
    Ok(Value::Float(result))
}

fn compare(op: CompareOp, left: &Value<'_>, right: &Value<'_>) -> Result<bool, EvalError> {
    match op {
        CompareOp::Eq => Ok(equals(left, right)),
        CompareOp::Ne => Ok(!equals(left, right)),
        CompareOp::In => contains(right, left),
        CompareOp::NotIn => contains(right, left).map(|found| !found),
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            let Some(ordering) = order(op, left, right)? else {
                return Ok(false);
            };
            Ok(match op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Le => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

/// Equality across types: numbers compare by value, everything else structurally.
fn equals(left: &Value<'_>, right: &Value<'_>) -> bool {
    match (Num::of(left), Num::of(right)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
        (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
        (Some(_), None) | (None, Some(_)) => false,
        (None, None) => match (left, right) {
            (Value::Null, Value::Null) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(x, y)| equals(&Value::from_node(x), &Value::from_node(y)))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, x)| {
                        b.get(key)
                            .is_some_and(|y| equals(&Value::from_node(x), &Value::from_node(y)))
                    })
            }
            _ => false,
        },
    }
}

/// Orders two values; `Ok(None)` when a NaN is involved.
fn order(
    op: CompareOp,
    left: &Value<'_>,
    right: &Value<'_>,
) -> Result<Option<Ordering>, EvalError> {
    if let (Some(a), Some(b)) = (Num::of(left), Num::of(right)) {
        return Ok(match (a, b) {
            (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
            _ => a.as_f64().partial_cmp(&b.as_f64()),
        });
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::Array(a), Value::Array(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                let (x, y) = (Value::from_node(x), Value::from_node(y));
                if !equals(&x, &y) {
                    return order(op, &x, &y);
                }
            }
            Ok(Some(a.len().cmp(&b.len())))
        }
        _ => Err(EvalError::TypeMismatch {
            op: op.symbol(),
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}

/// Membership of `item` in `container`: mapping keys, sequence elements or substrings.
fn contains(container: &Value<'_>, item: &Value<'_>) -> Result<bool, EvalError> {
    match (container, item) {
        (Value::Object(map), Value::Str(key)) => Ok(map.contains_key(&**key)),
        (Value::Object(_), Value::Array(_) | Value::Object(_)) => Err(EvalError::TypeMismatch {
            op: "in",
            left: item.type_name(),
            right: container.type_name(),
        }),
        (Value::Object(_), _) => Ok(false),
        (Value::Array(items), _) => Ok(items
            .iter()
            .any(|element| equals(&Value::from_node(element), item))),
        (Value::Str(haystack), Value::Str(needle)) => Ok(haystack.contains(&**needle)),
        _ => Err(EvalError::TypeMismatch {
            op: "in",
            left: item.type_name(),
            right: container.type_name(),
        }),
    }
}

/// Resolves a possibly negative index against a length.
fn position(index: i64, len: usize) -> Result<usize, EvalError> {
    let len = i64::try_from(len).map_err(|_| EvalError::Overflow)?;
    let resolved = if index < 0 { index + len } else { index };
    if (0..len).contains(&resolved) {
        usize::try_from(resolved).map_err(|_| EvalError::Overflow)
    } else {
        Err(EvalError::IndexOutOfRange(index))
    }
}

fn subscript<'a>(target: Value<'a>, index: &Value<'_>) -> Result<Value<'a>, EvalError> {
    let mismatch = |target: &Value<'_>| EvalError::TypeMismatch {
        op: "[]",
        left: target.type_name(),
        right: index.type_name(),
    };

    match target {
        Value::Array(items) => {
            let Some(Num::Int(i)) = Num::of(index) else {
                return Err(mismatch(&Value::Array(items)));
            };
            let at = position(i, items.len())?;
            Ok(match items {
                Cow::Borrowed(items) => Value::from_node(&items[at]),
                Cow::Owned(mut items) => Value::from_owned_node(items.swap_remove(at)),
            })
        }
        Value::Object(map) => {
            let Value::Str(key) = index else {
                return Err(mismatch(&Value::Object(map)));
            };
            match map {
                Cow::Borrowed(map) => map
                    .get(&**key)
                    .map(Value::from_node)
                    .ok_or_else(|| EvalError::MissingKey(key.to_string())),
                Cow::Owned(mut map) => map
                    .swap_remove(&**key)
                    .map(Value::from_owned_node)
                    .ok_or_else(|| EvalError::MissingKey(key.to_string())),
            }
        }
        Value::Str(s) => {
            let Some(Num::Int(i)) = Num::of(index) else {
                return Err(mismatch(&Value::Str(s)));
            };
            let at = position(i, s.chars().count())?;
            let ch = s.chars().nth(at).ok_or(EvalError::IndexOutOfRange(i))?;
            Ok(Value::Str(Cow::Owned(ch.to_string())))
        }
        other => Err(EvalError::NotSubscriptable(other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonpath::expr::parser::Parser;
    use serde_json::json;

    fn eval_with<'a>(
        source: &str,
        current: &'a Node,
        scope: Option<&Scope>,
    ) -> Result<Value<'a>, EvalError> {
        let expr = Parser::parse(source)?;
        Evaluator::new(scope).eval(&expr, current)
    }

    fn eval<'a>(source: &str, current: &'a Node) -> Result<Value<'a>, EvalError> {
        eval_with(source, current, None)
    }

    fn month() -> Node {
        Node::from(json!({
            "years": 2018,
            "month": "May",
            "tags": ["a", "b"],
            "meta": {"score": 2.5}
        }))
    }

    #[test]
    fn test_field_comparison() {
        let node = month();
        assert_eq!(eval("@.years == 2018", &node).unwrap(), Value::Bool(true));
        assert_eq!(eval("@.years > 2018", &node).unwrap(), Value::Bool(false));
        assert_eq!(eval("@.meta.score >= 2", &node).unwrap(), Value::Bool(true));
        assert_eq!(eval("@.month == 'May'", &node).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_length() {
        let node = Node::from(json!([1, 2, 3]));
        assert_eq!(eval("@.length-1", &node).unwrap(), Value::Int(2));
        let node = month();
        assert_eq!(eval("@.tags.length", &node).unwrap(), Value::Int(2));
        assert_eq!(eval("len(@.month)", &node).unwrap(), Value::Int(3));
        assert_eq!(
            eval("@.years.length", &node),
            Err(EvalError::NoLength("int"))
        );
    }

    #[test]
    fn test_connectives_return_operands() {
        let node = month();
        assert_eq!(eval("@.years && @.month", &node).unwrap(), Value::from("May"));
        assert_eq!(eval("0 or 'fallback'", &node).unwrap(), Value::from("fallback"));
        assert_eq!(eval("not @.tags", &node).unwrap(), Value::Bool(false));
        assert_eq!(eval("!0", &node).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_arithmetic_rounding() {
        let node = Node::Null;
        assert_eq!(eval("7 / 2", &node).unwrap(), Value::Float(3.5));
        assert_eq!(eval("-7 // 2", &node).unwrap(), Value::Int(-4));
        assert_eq!(eval("-7 % 3", &node).unwrap(), Value::Int(2));
        assert_eq!(eval("7 % -3", &node).unwrap(), Value::Int(-2));
        assert_eq!(eval("True + 1", &node).unwrap(), Value::Int(2));
        assert_eq!(eval("'ab' * 2", &node).unwrap(), Value::from("abab"));
        assert_eq!(eval("1 / 0", &node), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_repetition_is_bounded() {
        let node = month();
        assert_eq!(
            eval("@.tags * 2", &node).unwrap(),
            Value::Array(Cow::Owned(vec![
                Node::from("a"),
                Node::from("b"),
                Node::from("a"),
                Node::from("b"),
            ]))
        );
        assert_eq!(eval("@.tags * -1", &node).unwrap(), Value::Array(Cow::Owned(vec![])));
        assert_eq!(
            eval("@.tags * 9223372036854775807", &node),
            Err(EvalError::Overflow)
        );
        assert_eq!(
            eval("@.month * 9223372036854775807", &node),
            Err(EvalError::Overflow)
        );
        assert_eq!(eval("'a' * 4000000000", &node), Err(EvalError::Overflow));
    }

    #[test]
    fn test_membership() {
        let node = month();
        assert_eq!(eval("'a' in @.tags", &node).unwrap(), Value::Bool(true));
        assert_eq!(eval("'years' in @", &node).unwrap(), Value::Bool(true));
        assert_eq!(eval("'ay' in @.month", &node).unwrap(), Value::Bool(true));
        assert_eq!(eval("'z' not in @.tags", &node).unwrap(), Value::Bool(true));
        assert_eq!(eval("!@.hidden", &node).unwrap(), Value::Bool(true));
        assert_eq!(eval("!@.meta.score", &node).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_subscripts() {
        let node = month();
        assert_eq!(eval("@.tags[-1]", &node).unwrap(), Value::from("b"));
        assert_eq!(eval("@['month']", &node).unwrap(), Value::from("May"));
        assert_eq!(eval("@.month[0]", &node).unwrap(), Value::from("M"));
        assert_eq!(eval("@.tags[5]", &node), Err(EvalError::IndexOutOfRange(5)));
    }

    #[test]
    fn test_chained_comparison() {
        let node = month();
        assert_eq!(eval("2000 < @.years < 2020", &node).unwrap(), Value::Bool(true));
        assert_eq!(eval("2000 < @.years < 2010", &node).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_errors() {
        let node = month();
        assert_eq!(
            eval("@.missing == 1", &node),
            Err(EvalError::MissingKey("missing".to_string()))
        );
        assert!(matches!(
            eval("@.month < 3", &node),
            Err(EvalError::TypeMismatch { .. })
        ));
        assert_eq!(
            eval("helper(1)", &node),
            Err(EvalError::UnknownName("helper".to_string()))
        );
    }

    #[test]
    fn test_scope_functions_and_values() {
        let mut scope = Scope::new();
        scope
            .insert_fn("is_recent", |args: &[Value<'_>]| match args {
                [Value::Int(year)] => Ok(Value::Bool(*year >= 2018)),
                _ => Err(EvalError::custom("is_recent() expects a year")),
            })
            .insert_value("threshold", 2017_i64);

        let node = month();
        assert_eq!(
            eval_with("is_recent(@.years)", &node, Some(&scope)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            eval_with("@.years > threshold", &node, Some(&scope)).unwrap(),
            Value::Bool(true)
        );
    }
}
