//! Token stream wrapper for the hand-written parser.

use crate::foundation::Span;
use crate::lexer::{Token, TokenKind};
use crate::parser::ParseError;

/// Token stream with lookahead and span tracking.
pub struct TokenStream<'a> {
    tokens: &'a [Token],
    pos: usize,
    file_id: u16,
}

impl<'a> TokenStream<'a> {
    pub fn new(tokens: &'a [Token], file_id: u16) -> Self {
        Self {
            tokens,
            pos: 0,
            file_id,
        }
    }

    /// Current token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Current token kind without consuming it.
    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    /// Consume and return the current token.
    pub fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Whether the current token has the given kind.
    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    /// Consume the current token when it has the given kind.
    pub fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            self.advance()
        } else {
            None
        }
    }

    /// Consume a token of the given kind or report what was found.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance().expect("checked"))
        } else {
            Err(ParseError::expected_token(
                kind,
                self.peek(),
                self.current_span(),
            ))
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Span of the current token, or a zero-length span at EOF.
    pub fn current_span(&self) -> Span {
        match self.peek() {
            Some(token) => token.span,
            None => match self.tokens.last() {
                Some(last) => Span::new(self.file_id, last.span.end, last.span.end),
                None => Span::zero(self.file_id),
            },
        }
    }

    /// Skip declaration separators (newlines and semicolons).
    pub fn skip_separators(&mut self) {
        while matches!(
            self.peek_kind(),
            Some(TokenKind::Newline) | Some(TokenKind::Semicolon)
        ) {
            self.advance();
        }
    }

    /// Skip newlines only, inside delimited lists.
    pub fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Recover after a parse error: skip to the next declaration boundary.
    pub fn synchronize(&mut self) {
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Newline | TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::Import | TokenKind::Sum | TokenKind::Record => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn stream_of(source: &str) -> (Vec<Token>, u16) {
        let (tokens, errors) = lex(source, 0);
        assert!(errors.is_empty());
        (tokens, 0)
    }

    #[test]
    fn peek_and_advance() {
        let (tokens, fid) = stream_of("a b");
        let mut stream = TokenStream::new(&tokens, fid);
        assert_eq!(stream.peek().unwrap().lexeme, "a");
        assert_eq!(stream.advance().unwrap().lexeme, "a");
        assert_eq!(stream.advance().unwrap().lexeme, "b");
        assert!(stream.at_end());
        assert!(stream.advance().is_none());
    }

    #[test]
    fn expect_reports_found_token() {
        let (tokens, fid) = stream_of("a");
        let mut stream = TokenStream::new(&tokens, fid);
        let err = stream.expect(TokenKind::Define).unwrap_err();
        assert!(err.message.contains("expected"));
    }

    #[test]
    fn synchronize_stops_after_separator() {
        let (tokens, fid) = stream_of("junk tokens here\nnext");
        let mut stream = TokenStream::new(&tokens, fid);
        stream.synchronize();
        assert_eq!(stream.peek().unwrap().lexeme, "next");
    }

    #[test]
    fn synchronize_stops_at_declaration_keyword() {
        let (tokens, fid) = stream_of("junk sum t { }");
        let mut stream = TokenStream::new(&tokens, fid);
        stream.synchronize();
        assert_eq!(stream.peek_kind(), Some(TokenKind::Sum));
    }
}
