//! Visibility condition evaluation.
//!
//! Conditions are stored as short text expressions on sections and fields.
//! The grammar is deliberately narrow: comparisons of a named field against
//! a literal, combined with `&&`, `||`, `!` and parentheses.
//!
//!   country == "DE" && !(age != 18 || subscribed == true)
//!
//! A blank or absent condition is always visible. An expression that does
//! not parse fails open to visible with a logged warning, so a bad
//! condition never blocks a legitimate submission.

use serde_json::{Map, Value as JsonValue};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        field: String,
        op: CompareOp,
        literal: JsonValue,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
    Const(bool),
}

impl Condition {
    /// Total, side-effect-free evaluation against the submitted values.
    /// A field missing from the map compares as JSON null.
    pub fn evaluate(&self, values: &Map<String, JsonValue>) -> bool {
        match self {
            Condition::Const(value) => *value,
            Condition::Compare { field, op, literal } => {
                let actual = values.get(field).unwrap_or(&JsonValue::Null);
                let equal = json_eq(actual, literal);
                match op {
                    CompareOp::Eq => equal,
                    CompareOp::Ne => !equal,
                }
            }
            Condition::And(parts) => parts.iter().all(|c| c.evaluate(values)),
            Condition::Or(parts) => parts.iter().any(|c| c.evaluate(values)),
            Condition::Not(inner) => !inner.evaluate(values),
        }
    }
}

/// JSON equality with numeric coercion, so `18` matches `18.0`.
fn json_eq(a: &JsonValue, b: &JsonValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Decides whether a section or field with the given condition is currently
/// visible. Blank or missing condition means always visible; an expression
/// that fails to parse also yields visible (fail open), with a warning.
pub fn is_visible(condition: Option<&str>, values: &Map<String, JsonValue>) -> bool {
    let source = match condition {
        Some(text) if !text.trim().is_empty() => text,
        _ => return true,
    };
    match parse_condition(source) {
        Ok(cond) => cond.evaluate(values),
        Err(err) => {
            warn!(condition = source, error = %err, "unparseable visibility condition, failing open");
            true
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at offset {}", self.message, self.position)
    }
}

impl std::error::Error for ParseError {}

pub fn parse_condition(source: &str) -> Result<Condition, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let cond = parser.parse_or()?;
    match parser.peek() {
        None => Ok(cond),
        Some(_) => Err(parser.error("trailing input after expression")),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
}

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        match c {
            '(' => {
                tokens.push((Token::LParen, start));
                i += 1;
            }
            ')' => {
                tokens.push((Token::RParen, start));
                i += 1;
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push((Token::EqEq, start));
                    i += 2;
                } else {
                    return Err(ParseError {
                        message: "expected '=='".into(),
                        position: start,
                    });
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push((Token::NotEq, start));
                    i += 2;
                } else {
                    tokens.push((Token::Bang, start));
                    i += 1;
                }
            }
            '&' => {
                if chars.get(i + 1) == Some(&'&') {
                    tokens.push((Token::AndAnd, start));
                    i += 2;
                } else {
                    return Err(ParseError {
                        message: "expected '&&'".into(),
                        position: start,
                    });
                }
            }
            '|' => {
                if chars.get(i + 1) == Some(&'|') {
                    tokens.push((Token::OrOr, start));
                    i += 2;
                } else {
                    return Err(ParseError {
                        message: "expected '||'".into(),
                        position: start,
                    });
                }
            }
            '"' | '\'' => {
                let quote = c;
                i += 1;
                let mut text = String::new();
                loop {
                    match chars.get(i) {
                        Some(&ch) if ch == quote => {
                            i += 1;
                            break;
                        }
                        Some(&ch) => {
                            text.push(ch);
                            i += 1;
                        }
                        None => {
                            return Err(ParseError {
                                message: "unterminated string literal".into(),
                                position: start,
                            });
                        }
                    }
                }
                tokens.push((Token::Str(text), start));
            }
            _ if c.is_ascii_digit() || c == '-' => {
                let mut end = i + 1;
                while end < chars.len()
                    && (chars[end].is_ascii_digit() || chars[end] == '.')
                {
                    end += 1;
                }
                let text: String = chars[i..end].iter().collect();
                let num = text.parse::<f64>().map_err(|_| ParseError {
                    message: format!("invalid number '{}'", text),
                    position: start,
                })?;
                tokens.push((Token::Num(num), start));
                i = end;
            }
            _ if c.is_alphanumeric() || c == '_' => {
                let mut end = i + 1;
                while end < chars.len()
                    && (chars[end].is_alphanumeric() || chars[end] == '_' || chars[end] == '.')
                {
                    end += 1;
                }
                let text: String = chars[i..end].iter().collect();
                let token = match text.as_str() {
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    "null" => Token::Null,
                    _ => Token::Ident(text),
                };
                tokens.push((token, start));
                i = end;
            }
            _ => {
                return Err(ParseError {
                    message: format!("unexpected character '{}'", c),
                    position: start,
                });
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: &str) -> ParseError {
        let position = self
            .tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(_, p)| *p)
            .unwrap_or(0);
        ParseError {
            message: message.into(),
            position,
        }
    }

    fn parse_or(&mut self) -> Result<Condition, ParseError> {
        let mut parts = vec![self.parse_and()?];
        while self.peek() == Some(&Token::OrOr) {
            self.next();
            parts.push(self.parse_and()?);
        }
        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(Condition::Or(parts))
        }
    }

    fn parse_and(&mut self) -> Result<Condition, ParseError> {
        let mut parts = vec![self.parse_unary()?];
        while self.peek() == Some(&Token::AndAnd) {
            self.next();
            parts.push(self.parse_unary()?);
        }
        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(Condition::And(parts))
        }
    }

    fn parse_unary(&mut self) -> Result<Condition, ParseError> {
        if self.peek() == Some(&Token::Bang) {
            self.next();
            let inner = self.parse_unary()?;
            return Ok(Condition::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Condition, ParseError> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.error("expected ')'")),
                }
            }
            Some(Token::Bool(value)) => Ok(Condition::Const(value)),
            Some(Token::Ident(field)) => {
                let op = match self.next() {
                    Some(Token::EqEq) => CompareOp::Eq,
                    Some(Token::NotEq) => CompareOp::Ne,
                    _ => return Err(self.error("expected '==' or '!=' after field name")),
                };
                let literal = match self.next() {
                    Some(Token::Str(s)) => JsonValue::from(s),
                    Some(Token::Num(n)) => serde_json::Number::from_f64(n)
                        .map(JsonValue::Number)
                        .unwrap_or(JsonValue::Null),
                    Some(Token::Bool(b)) => JsonValue::Bool(b),
                    Some(Token::Null) => JsonValue::Null,
                    _ => return Err(self.error("expected literal after comparison operator")),
                };
                Ok(Condition::Compare { field, op, literal })
            }
            _ => Err(self.error("expected condition")),
        }
    }
}
