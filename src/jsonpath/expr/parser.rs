//! Recursive-descent parser for filter and computed-index expressions.
//!
//! Precedence, loosest first:
//!
//! | level          | operators                                   |
//! |----------------|---------------------------------------------|
//! | disjunction    | `or`, `\|\|`                                |
//! | conjunction    | `and`, `&&`                                 |
//! | negation       | `not`                                       |
//! | comparison     | `==` `!=` `<` `<=` `>` `>=` `in` `not in`   |
//! | additive       | `+` `-`                                     |
//! | multiplicative | `*` `/` `//` `%`                            |
//! | unary          | `-` `+` `!`                                 |
//! | postfix        | `x[i]`, `f(a, b)`                           |

use super::ast::{BinaryOp, CompareOp, Expr, Literal, UnaryOp};
use super::lexer::{Lexer, Spanned, Tok};
use crate::jsonpath::error::EvalError;

/// Deepest expression tree the parser builds. Operator chains count as well as
/// brackets, so evaluating and dropping the tree stay within the stack.
const MAX_DEPTH: usize = 128;

/// Parser over a tokenized expression.
pub struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    /// Parses a complete expression. Trailing tokens are an error.
    pub fn parse(source: &str) -> Result<Expr, EvalError> {
        let tokens = Lexer::tokenize(source)?;
        let mut parser = Parser {
            tokens,
            position: 0,
            end: source.len(),
            depth: 0,
        };
        if parser.is_eof() {
            return Err(EvalError::syntax(0, "empty expression"));
        }
        let expr = parser.parse_or()?;
        if let Some((tok, offset)) = parser.tokens.get(parser.position) {
            return Err(EvalError::syntax(
                *offset,
                format!("unexpected {:?} after expression", tok),
            ));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.position).map(|(tok, _)| tok)
    }

    fn peek_second(&self) -> Option<&Tok> {
        self.tokens.get(self.position + 1).map(|(tok, _)| tok)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .map_or(self.end, |(_, offset)| *offset)
    }

    fn next(&mut self) -> Option<Tok> {
        let (tok, _) = self.tokens.get(self.position)?.clone();
        self.position += 1;
        Some(tok)
    }

    fn is_eof(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn at_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Tok::Ident(ident)) if ident == word)
    }

    fn expect(&mut self, expected: Tok, what: &str) -> Result<(), EvalError> {
        let offset = self.offset();
        match self.next() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => Err(EvalError::syntax(
                offset,
                format!("expected {}, found {:?}", what, tok),
            )),
            None => Err(EvalError::syntax(offset, format!("expected {}", what))),
        }
    }

    /// Enters one level of nesting, failing past [`MAX_DEPTH`].
    fn enter(&mut self) -> Result<(), EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::syntax(
                self.offset(),
                "expression nested too deeply",
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr, EvalError> {
        let depth = self.depth;
        self.enter()?;
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Tok::OrOr)) || self.at_keyword("or") {
            self.next();
            self.enter()?;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, EvalError> {
        let depth = self.depth;
        let mut left = self.parse_not()?;
        while matches!(self.peek(), Some(Tok::AndAnd)) || self.at_keyword("and") {
            self.next();
            self.enter()?;
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, EvalError> {
        if self.at_keyword("not") {
            self.next();
            self.enter()?;
            let operand = self.parse_not()?;
            self.depth -= 1;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn compare_op(&self) -> Option<(CompareOp, usize)> {
        let op = match self.peek()? {
            Tok::EqEq => CompareOp::Eq,
            Tok::NotEq => CompareOp::Ne,
            Tok::Lt => CompareOp::Lt,
            Tok::Le => CompareOp::Le,
            Tok::Gt => CompareOp::Gt,
            Tok::Ge => CompareOp::Ge,
            Tok::Ident(word) if word == "in" => CompareOp::In,
            Tok::Ident(word)
                if word == "not"
                    && matches!(self.peek_second(), Some(Tok::Ident(next)) if next == "in") =>
            {
                return Some((CompareOp::NotIn, 2));
            }
            _ => return None,
        };
        Some((op, 1))
    }

    fn parse_comparison(&mut self) -> Result<Expr, EvalError> {
        let first = self.parse_additive()?;
        let mut rest = Vec::new();
        while let Some((op, width)) = self.compare_op() {
            self.position += width;
            rest.push((op, self.parse_additive()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, EvalError> {
        let depth = self.depth;
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinaryOp::Add,
                Some(Tok::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.next();
            self.enter()?;
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, EvalError> {
        let depth = self.depth;
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => BinaryOp::Mul,
                Some(Tok::Slash) => BinaryOp::Div,
                Some(Tok::SlashSlash) => BinaryOp::FloorDiv,
                Some(Tok::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.next();
            self.enter()?;
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Some(Tok::Minus) => UnaryOp::Neg,
            Some(Tok::Plus) => UnaryOp::Pos,
            Some(Tok::Bang) => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.next();
        self.enter()?;
        let operand = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.parse_primary()?;
        let depth = self.depth;
        while matches!(self.peek(), Some(Tok::LBracket)) {
            self.next();
            self.enter()?;
            let index = self.parse_or()?;
            self.expect(Tok::RBracket, "']'")?;
            expr = Expr::Subscript {
                target: Box::new(expr),
                index: Box::new(index),
            };
        }
        self.depth = depth;
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let offset = self.offset();
        let Some(tok) = self.next() else {
            return Err(EvalError::syntax(offset, "unexpected end of expression"));
        };

        match tok {
            Tok::Int(i) => Ok(Expr::Literal(Literal::Int(i))),
            Tok::Float(f) => Ok(Expr::Literal(Literal::Float(f))),
            Tok::Str(s) => Ok(Expr::Literal(Literal::Str(s))),
            Tok::Current(segments) => current(segments, offset),
            Tok::NotMember(segments) => not_member(segments, offset),
            Tok::LParen => {
                let inner = self.parse_or()?;
                self.expect(Tok::RParen, "')'")?;
                Ok(inner)
            }
            Tok::Ident(name) => match name.as_str() {
                "True" | "true" => Ok(Expr::Literal(Literal::Bool(true))),
                "False" | "false" => Ok(Expr::Literal(Literal::Bool(false))),
                "None" | "null" => Ok(Expr::Literal(Literal::Null)),
                "and" | "or" | "not" | "in" => Err(EvalError::syntax(
                    offset,
                    format!("unexpected keyword '{}'", name),
                )),
                _ if matches!(self.peek(), Some(Tok::LParen)) => {
                    self.next();
                    let args = self.parse_arguments()?;
                    Ok(Expr::Call { name, args })
                }
                _ => Ok(Expr::Name(name)),
            },
            other => Err(EvalError::syntax(
                offset,
                format!("unexpected {:?}", other),
            )),
        }
    }

    /// Parses call arguments; the opening `(` is already consumed.
    fn parse_arguments(&mut self) -> Result<Vec<Expr>, EvalError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(Tok::RParen)) {
            self.next();
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            let offset = self.offset();
            match self.next() {
                Some(Tok::Comma) => {
                    if matches!(self.peek(), Some(Tok::RParen)) {
                        self.next();
                        return Ok(args);
                    }
                }
                Some(Tok::RParen) => return Ok(args),
                _ => return Err(EvalError::syntax(offset, "expected ',' or ')'")),
            }
        }
    }
}

/// Builds `@` access, turning a trailing `length` into a length query.
fn current(mut segments: Vec<String>, offset: usize) -> Result<Expr, EvalError> {
    if segments.iter().any(String::is_empty) {
        return Err(EvalError::syntax(offset, "empty field name after '@'"));
    }
    if segments.last().is_some_and(|last| last == "length") {
        segments.pop();
        return Ok(Expr::Length(segments));
    }
    Ok(Expr::Current(segments))
}

fn not_member(mut segments: Vec<String>, offset: usize) -> Result<Expr, EvalError> {
    if segments.iter().any(String::is_empty) {
        return Err(EvalError::syntax(offset, "empty field name after '!@'"));
    }
    let key = segments
        .pop()
        .ok_or_else(|| EvalError::syntax(offset, "expected a key after '!@.'"))?;
    Ok(Expr::NotMember {
        parent: segments,
        key,
    })
}
