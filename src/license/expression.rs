//! SPDX license expressions
//!
//! Scanners report per-file findings as compound expressions such as
//! `MIT AND BSD-3-Clause` or `GPL-2.0-only WITH Classpath-exception-2.0`.
//! The code coverage check evaluates each top-level conjunct on its own, so
//! this module parses the expression and splits it on `AND`.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! any     := all ("OR" all)*
//! all     := term ("AND" term)*
//! term    := "(" any ")" | license
//! license := IDENT ("WITH" IDENT)?
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected '{0}' at token {1}")]
    Unexpected(String, usize),

    #[error("missing ')' for '(' at token {0}")]
    Unclosed(usize),
}

/// A parsed SPDX license expression. `AND`/`OR` chains are flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpdxExpression {
    License {
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        exception: Option<String>,
    },
    All(Vec<SpdxExpression>),
    Any(Vec<SpdxExpression>),
}

impl SpdxExpression {
    pub fn parse(input: &str) -> Result<Self, ExpressionError> {
        let tokens = lex(input);
        let mut parser = Parser { tokens: &tokens, pos: 0 };
        let expr = parser.any()?;
        match parser.peek() {
            None => Ok(expr),
            Some(tok) => Err(ExpressionError::Unexpected(tok.to_string(), parser.pos)),
        }
    }

    /// Every license identifier mentioned, exceptions excluded
    pub fn licenses(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_licenses(&mut out);
        out
    }

    fn collect_licenses<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            SpdxExpression::License { id, .. } => out.push(id.as_str()),
            SpdxExpression::All(items) | SpdxExpression::Any(items) => {
                items.iter().for_each(|e| e.collect_licenses(out))
            }
        }
    }

    /// Operands of the top-level `AND`, left to right
    pub fn conjuncts(&self) -> Vec<&SpdxExpression> {
        match self {
            SpdxExpression::All(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    fn binds_looser_than_and(&self) -> bool {
        matches!(self, SpdxExpression::Any(_))
    }
}

impl fmt::Display for SpdxExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpdxExpression::License { id, exception: None } => write!(f, "{}", id),
            SpdxExpression::License {
                id,
                exception: Some(exc),
            } => write!(f, "{} WITH {}", id, exc),
            SpdxExpression::All(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|e| {
                        if e.binds_looser_than_and() {
                            format!("({})", e)
                        } else {
                            e.to_string()
                        }
                    })
                    .collect();
                write!(f, "{}", parts.join(" AND "))
            }
            SpdxExpression::Any(items) => {
                let parts: Vec<String> = items.iter().map(|e| e.to_string()).collect();
                write!(f, "{}", parts.join(" OR "))
            }
        }
    }
}

/// Split a detected expression into the identifiers that must each be
/// declared. Unparsable input falls back to a plain `" AND "` split.
pub fn conjuncts(expression: &str) -> Vec<String> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    match SpdxExpression::parse(trimmed) {
        Ok(expr) => expr.conjuncts().into_iter().map(|c| c.to_string()).collect(),
        Err(e) => {
            tracing::debug!("Unparsable license expression {:?}: {}", trimmed, e);
            trimmed
                .split(" AND ")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        }
    }
}

// ─── Lexer ─────────────────────────────────────────────────────────

/// Operators are upper case only; anything else is an identifier
fn lex(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for word in input.split_whitespace() {
        let mut rest = word;
        while !rest.is_empty() {
            let cut = rest.find(['(', ')']).unwrap_or(rest.len());
            if cut == 0 {
                tokens.push(&rest[..1]);
                rest = &rest[1..];
            } else {
                tokens.push(&rest[..cut]);
                rest = &rest[cut..];
            }
        }
    }
    tokens
}

fn is_operator(tok: &str) -> bool {
    matches!(tok, "AND" | "OR" | "WITH" | "(" | ")")
}

// ─── Parser ────────────────────────────────────────────────────────

struct Parser<'t, 'a> {
    tokens: &'t [&'a str],
    pos: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<&'a str> {
        let tok = self.peek()?;
        self.pos += 1;
        Some(tok)
    }

    fn eat(&mut self, expected: &str) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn any(&mut self) -> Result<SpdxExpression, ExpressionError> {
        let mut items = vec![self.all()?];
        while self.eat("OR") {
            items.push(self.all()?);
        }
        Ok(chain(items, false))
    }

    fn all(&mut self) -> Result<SpdxExpression, ExpressionError> {
        let mut items = vec![self.term()?];
        while self.eat("AND") {
            items.push(self.term()?);
        }
        Ok(chain(items, true))
    }

    fn term(&mut self) -> Result<SpdxExpression, ExpressionError> {
        let open = self.pos;
        if self.eat("(") {
            let inner = self.any()?;
            if !self.eat(")") {
                return Err(ExpressionError::Unclosed(open));
            }
            return Ok(inner);
        }
        let id = self.identifier()?;
        let exception = if self.eat("WITH") {
            Some(self.identifier()?)
        } else {
            None
        };
        Ok(SpdxExpression::License { id, exception })
    }

    fn identifier(&mut self) -> Result<String, ExpressionError> {
        let at = self.pos;
        match self.bump() {
            None => Err(ExpressionError::UnexpectedEnd),
            Some(tok) if is_operator(tok) => Err(ExpressionError::Unexpected(tok.to_string(), at)),
            Some(tok) => Ok(tok.to_string()),
        }
    }
}

/// Single operand stays bare; nested chains of the same operator merge
fn chain(mut items: Vec<SpdxExpression>, conjunction: bool) -> SpdxExpression {
    if items.len() == 1 {
        if let Some(only) = items.pop() {
            return only;
        }
    }
    let mut merged = Vec::with_capacity(items.len());
    for item in items {
        match item {
            SpdxExpression::All(inner) if conjunction => merged.extend(inner),
            SpdxExpression::Any(inner) if !conjunction => merged.extend(inner),
            other => merged.push(other),
        }
    }
    if conjunction {
        SpdxExpression::All(merged)
    } else {
        SpdxExpression::Any(merged)
    }
}
