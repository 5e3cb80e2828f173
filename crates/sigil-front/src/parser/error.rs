//! Parse errors and recovery support.

use crate::foundation::Span;
use crate::lexer::{Token, TokenKind};
use thiserror::Error;

/// Category of parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Found one token, expected another
    UnexpectedToken,
    /// Ran out of input
    UnexpectedEof,
    /// Structurally invalid syntax
    InvalidSyntax,
}

/// Parse error with source location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

impl ParseError {
    /// An "expected X, found Y" error.
    pub fn expected_token(expected: TokenKind, found: Option<&Token>, span: Span) -> Self {
        let message = match found {
            Some(token) => format!("expected {:?}, found '{}'", expected, token),
            None => format!("expected {:?}, found end of input", expected),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    /// An "unexpected token" error with context.
    pub fn unexpected_token(found: Option<&Token>, context: &str, span: Span) -> Self {
        let message = match found {
            Some(token) => format!("unexpected '{}' {}", token, context),
            None => format!("unexpected end of input {}", context),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    /// A structural error.
    pub fn invalid_syntax(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::InvalidSyntax,
            span,
            message: message.into(),
        }
    }
}
