//! Lexical analysis for Sigil source text, built on logos.
//!
//! Newlines are significant (they separate declarations) and are emitted as
//! tokens; all other whitespace and `//` comments are skipped. A
//! [`Token`] bundles its kind with the lexeme and source span so later
//! phases never need the original text.

use crate::foundation::Span;
use logos::Logos;
use serde::{Deserialize, Serialize};

/// Sigil token kind.
///
/// `Undefined` is a sentinel used by the AST for synthesized tokens (for
/// example the identifier slot of a symbol tuple); the lexer never
/// produces it.
#[derive(
    Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    // Keywords
    /// Keyword `import`
    #[token("import")]
    Import,
    /// Keyword `sum`
    #[token("sum")]
    Sum,
    /// Keyword `record`
    #[token("record")]
    Record,

    // Punctuation
    /// `:=`
    #[token(":=")]
    Define,
    /// `->`
    #[token("->")]
    Arrow,
    /// `=`
    #[token("=")]
    Equals,
    /// `:`
    #[token(":")]
    Colon,
    /// `,`
    #[token(",")]
    Comma,
    /// `;`
    #[token(";")]
    Semicolon,
    /// Line break (declaration separator)
    #[token("\n")]
    Newline,

    // Delimiters
    /// `(`
    #[token("(")]
    OpenParen,
    /// `)`
    #[token(")")]
    CloseParen,
    /// `[`
    #[token("[")]
    OpenBracket,
    /// `]`
    #[token("]")]
    CloseBracket,
    /// `<`
    #[token("<")]
    OpenAngle,
    /// `>`
    #[token(">")]
    CloseAngle,
    /// `{`
    #[token("{")]
    OpenBrace,
    /// `}`
    #[token("}")]
    CloseBrace,

    // Literals and names
    /// Integer literal
    #[regex(r"[0-9]+")]
    Integer,
    /// Identifier
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,
    /// Free variable: an identifier marked for unification, `\T`
    #[regex(r"\\[A-Za-z_][A-Za-z0-9_]*")]
    FreeVariable,

    /// Sentinel for synthesized tokens. Bound to NUL so it can never come
    /// out of real source text.
    #[token("\0")]
    Undefined,
}

impl TokenKind {
    /// True for token kinds that name things (plain or free-variable).
    pub fn is_identifier(self) -> bool {
        matches!(self, TokenKind::Identifier | TokenKind::FreeVariable)
    }
}

/// A lexed token: kind, lexeme, and source span.
///
/// Free-variable lexemes are stored without the leading backslash so the
/// name compares equal to the plain identifier form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    /// The `Undefined` sentinel token.
    pub fn undefined() -> Self {
        Self::new(TokenKind::Undefined, "", Span::zero(0))
    }

    /// A synthesized identifier token with no real source position.
    pub fn synthetic(name: impl Into<String>) -> Self {
        Self::new(TokenKind::Identifier, name, Span::zero(0))
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Newline => write!(f, "\\n"),
            TokenKind::Undefined => write!(f, "<undefined>"),
            _ => write!(f, "{}", self.lexeme),
        }
    }
}

/// Tokenize a source file.
///
/// Returns the token stream plus the spans of any unrecognized input; the
/// caller turns those into syntax diagnostics.
pub fn lex(source: &str, file_id: u16) -> (Vec<Token>, Vec<Span>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    let mut lexer = TokenKind::lexer(source);
    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(file_id, range.start as u32, range.end as u32);
        match result {
            Ok(kind) => {
                let lexeme = match kind {
                    TokenKind::FreeVariable => &lexer.slice()[1..],
                    _ => lexer.slice(),
                };
                tokens.push(Token::new(kind, lexeme, span));
            }
            Err(()) => errors.push(span),
        }
    }

    (tokens, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = lex(source, 0);
        assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_and_punctuation() {
        assert_eq!(
            kinds("import sum record := -> = : , ;"),
            vec![
                TokenKind::Import,
                TokenKind::Sum,
                TokenKind::Record,
                TokenKind::Define,
                TokenKind::Arrow,
                TokenKind::Equals,
                TokenKind::Colon,
                TokenKind::Comma,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn delimiters() {
        assert_eq!(
            kinds("( ) [ ] < > { }"),
            vec![
                TokenKind::OpenParen,
                TokenKind::CloseParen,
                TokenKind::OpenBracket,
                TokenKind::CloseBracket,
                TokenKind::OpenAngle,
                TokenKind::CloseAngle,
                TokenKind::OpenBrace,
                TokenKind::CloseBrace,
            ]
        );
    }

    #[test]
    fn identifiers_and_integers() {
        let (tokens, _) = lex("vec x_1 42", 0);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme, "vec");
        assert_eq!(tokens[1].lexeme, "x_1");
        assert_eq!(tokens[2].kind, TokenKind::Integer);
        assert_eq!(tokens[2].lexeme, "42");
    }

    #[test]
    fn free_variable_lexeme_drops_backslash() {
        let (tokens, _) = lex(r"\T", 0);
        assert_eq!(tokens[0].kind, TokenKind::FreeVariable);
        assert_eq!(tokens[0].lexeme, "T");
    }

    #[test]
    fn newlines_are_tokens_comments_are_not() {
        assert_eq!(
            kinds("x // trailing comment\ny"),
            vec![
                TokenKind::Identifier,
                TokenKind::Newline,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn spans_index_the_source() {
        let source = "abc := 12";
        let (tokens, _) = lex(source, 0);
        let span = tokens[2].span;
        assert_eq!(&source[span.start as usize..span.end as usize], "12");
    }

    #[test]
    fn invalid_input_is_reported() {
        let (tokens, errors) = lex("x @ y", 0);
        assert_eq!(tokens.len(), 2);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn declaration_fragment() {
        assert_eq!(
            kinds("f x : int = x"),
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Identifier,
                TokenKind::Equals,
                TokenKind::Identifier,
            ]
        );
    }
}
