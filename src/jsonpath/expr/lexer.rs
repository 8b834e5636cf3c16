//! Tokenizer for filter and computed-index expressions.

use crate::jsonpath::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    /// `@` followed by its dotted segments, if any
    Current(Vec<String>),
    /// `!@.` followed by its dotted segments
    NotMember(Vec<String>),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,
}

/// A token and the byte offset it starts at.
pub type Spanned = (Tok, usize);

pub struct Lexer<'s> {
    input: &'s str,
    position: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(input: &'s str) -> Self {
        Self { input, position: 0 }
    }

    /// Splits the whole input into tokens.
    pub fn tokenize(input: &'s str) -> Result<Vec<Spanned>, EvalError> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input[self.position..].chars().nth(offset)
    }

    fn next(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.next();
        }
    }

    fn next_token(&mut self) -> Result<Option<Spanned>, EvalError> {
        self.skip_whitespace();
        let start = self.position;
        let Some(ch) = self.next() else {
            return Ok(None);
        };

        let tok = match ch {
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            '[' => Tok::LBracket,
            ']' => Tok::RBracket,
            ',' => Tok::Comma,
            '+' => Tok::Plus,
            '-' => Tok::Minus,
            '*' => Tok::Star,
            '%' => Tok::Percent,
            '/' => {
                if self.peek() == Some('/') {
                    self.next();
                    Tok::SlashSlash
                } else {
                    Tok::Slash
                }
            }
            '=' => {
                if self.next() == Some('=') {
                    Tok::EqEq
                } else {
                    return Err(EvalError::syntax(start, "assignment is not allowed"));
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.next();
                    Tok::NotEq
                } else if self.peek() == Some('@') && self.peek_at(1) == Some('.') {
                    self.next();
                    self.next();
                    Tok::NotMember(self.segments(true))
                } else {
                    Tok::Bang
                }
            }
            '<' => self.with_eq(Tok::Lt, Tok::Le),
            '>' => self.with_eq(Tok::Gt, Tok::Ge),
            '&' => self.doubled('&', Tok::AndAnd, start)?,
            '|' => self.doubled('|', Tok::OrOr, start)?,
            '@' => {
                if self.peek() == Some('.') {
                    self.next();
                    let segments = self.segments(false);
                    if segments.iter().all(String::is_empty) {
                        return Err(EvalError::syntax(start, "expected a field after '@.'"));
                    }
                    Tok::Current(segments)
                } else {
                    Tok::Current(Vec::new())
                }
            }
            '\'' | '"' => Tok::Str(self.string(ch, start)?),
            '0'..='9' => self.number(start)?,
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::from(c);
                while let Some(c) = self.peek().filter(|c| c.is_alphanumeric() || *c == '_') {
                    ident.push(c);
                    self.next();
                }
                Tok::Ident(ident)
            }
            other => {
                return Err(EvalError::syntax(
                    start,
                    format!("unexpected character '{}'", other),
                ))
            }
        };

        Ok(Some((tok, start)))
    }

    fn with_eq(&mut self, bare: Tok, with: Tok) -> Tok {
        if self.peek() == Some('=') {
            self.next();
            with
        } else {
            bare
        }
    }

    fn doubled(&mut self, ch: char, tok: Tok, start: usize) -> Result<Tok, EvalError> {
        if self.next() == Some(ch) {
            Ok(tok)
        } else {
            Err(EvalError::syntax(start, format!("expected '{}{}'", ch, ch)))
        }
    }

    /// Reads the dotted run after `@.`; the leading dot is already consumed.
    ///
    /// Membership tests also allow `-` in names but stop at dots into the
    /// parent path the same way.
    fn segments(&mut self, allow_dash: bool) -> Vec<String> {
        let mut run = String::new();
        while let Some(c) = self.peek().filter(|c| {
            c.is_ascii_alphanumeric() || matches!(*c, '_' | '@' | '.') || (allow_dash && *c == '-')
        }) {
            run.push(c);
            self.next();
        }
        run.split('.').map(str::to_string).collect()
    }

    fn string(&mut self, quote: char, start: usize) -> Result<String, EvalError> {
        let mut value = String::new();
        loop {
            match self.next() {
                Some(c) if c == quote => return Ok(value),
                Some('\\') => match self.next() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some(c @ ('\\' | '\'' | '"' | '@')) => value.push(c),
                    Some(c) => {
                        value.push('\\');
                        value.push(c);
                    }
                    None => break,
                },
                Some(c) => value.push(c),
                None => break,
            }
        }
        Err(EvalError::syntax(start, "unterminated string literal"))
    }

    fn number(&mut self, start: usize) -> Result<Tok, EvalError> {
        let mut is_float = false;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.next();
        }
        if self.peek() == Some('.') && self.peek_at(1).map_or(true, |c| c.is_ascii_digit()) {
            is_float = true;
            self.next();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.next();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let exponent_digit = match self.peek_at(1) {
                Some('+' | '-') => self.peek_at(2),
                other => other,
            };
            if exponent_digit.is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.next();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.next();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.next();
                }
            }
        }

        let text = &self.input[start..self.position];
        if !is_float {
            if let Ok(int) = text.parse::<i64>() {
                return Ok(Tok::Int(int));
            }
        }
        text.parse::<f64>()
            .map(Tok::Float)
            .map_err(|_| EvalError::syntax(start, format!("invalid number '{}'", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(input: &str) -> Vec<Tok> {
        Lexer::tokenize(input)
            .unwrap()
            .into_iter()
            .map(|(tok, _)| tok)
            .collect()
    }

    #[test]
    fn test_current_paths() {
        assert_eq!(toks("@"), vec![Tok::Current(vec![])]);
        assert_eq!(
            toks("@.a.0.b"),
            vec![Tok::Current(vec!["a".into(), "0".into(), "b".into()])]
        );
    }

    #[test]
    fn test_comparison() {
        assert_eq!(
            toks("@.years>=2018"),
            vec![Tok::Current(vec!["years".into()]), Tok::Ge, Tok::Int(2018)]
        );
    }

    #[test]
    fn test_not_member_vs_not_equal() {
        assert_eq!(
            toks("!@.my-key"),
            vec![Tok::NotMember(vec!["my-key".into()])]
        );
        assert_eq!(
            toks("@.a!=1"),
            vec![Tok::Current(vec!["a".into()]), Tok::NotEq, Tok::Int(1)]
        );
        assert_eq!(toks("!@"), vec![Tok::Bang, Tok::Current(vec![])]);
    }

    #[test]
    fn test_dash_is_minus_in_paths() {
        assert_eq!(
            toks("@.length-1"),
            vec![Tok::Current(vec!["length".into()]), Tok::Minus, Tok::Int(1)]
        );
    }

    #[test]
    fn test_strings_and_escaped_at() {
        assert_eq!(toks(r"'a\@b.com'"), vec![Tok::Str("a@b.com".into())]);
        assert_eq!(toks(r#""it\"s""#), vec![Tok::Str("it\"s".into())]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(toks("12 1.5 2e3"), vec![Tok::Int(12), Tok::Float(1.5), Tok::Float(2000.0)]);
    }

    #[test]
    fn test_connectives() {
        assert_eq!(
            toks("a && b || c // d"),
            vec![
                Tok::Ident("a".into()),
                Tok::AndAnd,
                Tok::Ident("b".into()),
                Tok::OrOr,
                Tok::Ident("c".into()),
                Tok::SlashSlash,
                Tok::Ident("d".into()),
            ]
        );
    }

    #[test]
    fn test_errors() {
        assert!(Lexer::tokenize("@.a = 1").is_err());
        assert!(Lexer::tokenize("'open").is_err());
        assert!(Lexer::tokenize("@.a & 1").is_err());
        assert!(Lexer::tokenize("@.").is_err());
        assert!(Lexer::tokenize("$").is_err());
    }
}
