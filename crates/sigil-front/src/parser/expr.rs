//! Expression parsing.
//!
//! Expressions are juxtaposition applies over primaries, with `:` forming
//! constraints at the lowest precedence:
//!
//! ```text
//! expr    := apply { ":" apply }
//! apply   := primary { primary }
//! primary := Integer | Identifier | FreeVariable
//!          | Identifier "<" [ list ] ">"      (adjacent "<" only)
//!          | "<" list ">"                     (symbol tuple)
//!          | "(" [ list ] ")" | "[" list "]"  (plus half-open pairings)
//! ```
//!
//! A unary apply is never constructed; a single primary is itself.

use crate::ast::Expr;
use crate::lexer::{Token, TokenKind};
use crate::parser::stream::TokenStream;
use crate::parser::ParseError;

/// Whether a token kind can begin a primary expression.
pub fn starts_primary(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Integer
            | TokenKind::Identifier
            | TokenKind::FreeVariable
            | TokenKind::OpenParen
            | TokenKind::OpenBracket
            | TokenKind::OpenAngle
    )
}

/// Parse a full expression.
pub fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let mut subject = parse_apply(stream)?;
    while stream.eat(TokenKind::Colon).is_some() {
        let constraint = parse_apply(stream)?;
        subject = Expr::constraint(subject, constraint);
    }
    Ok(subject)
}

/// Parse a juxtaposition apply (or a lone primary).
pub fn parse_apply(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let mut items = vec![parse_primary(stream)?];
    while let Some(kind) = stream.peek_kind() {
        if !starts_primary(kind) {
            break;
        }
        items.push(parse_primary(stream)?);
    }
    if items.len() == 1 {
        Ok(items.pop().expect("one item"))
    } else {
        Ok(Expr::apply(items))
    }
}

/// Parse one primary expression.
pub fn parse_primary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    match stream.peek_kind() {
        Some(TokenKind::Integer) | Some(TokenKind::FreeVariable) => {
            Ok(Expr::primary(stream.advance().expect("peeked")))
        }
        Some(TokenKind::Identifier) => {
            let identifier = stream.advance().expect("peeked");
            if angle_adjacent(stream, &identifier) {
                let open = stream.advance().expect("peeked");
                let items = parse_angle_list(stream)?;
                let close = stream.expect(TokenKind::CloseAngle)?;
                Ok(Expr::symbol_delimited(identifier, open, close, items))
            } else {
                Ok(Expr::primary(identifier))
            }
        }
        Some(TokenKind::OpenAngle) => {
            let open = stream.advance().expect("peeked");
            let items = parse_angle_list(stream)?;
            let close = stream.expect(TokenKind::CloseAngle)?;
            Ok(Expr::symbol_tuple(open, close, items))
        }
        Some(TokenKind::OpenParen) | Some(TokenKind::OpenBracket) => parse_tuple(stream),
        _ => Err(ParseError::unexpected_token(
            stream.peek(),
            "where an expression was expected",
            stream.current_span(),
        )),
    }
}

/// An identifier opens a symbol parameter list only when the `<` touches
/// it, `vec<int>`; `vec <int>` applies `vec` to a symbol tuple.
fn angle_adjacent(stream: &TokenStream, identifier: &Token) -> bool {
    match stream.peek() {
        Some(next) => {
            next.kind == TokenKind::OpenAngle
                && next.span.file_id == identifier.span.file_id
                && next.span.start == identifier.span.end
        }
        None => false,
    }
}

/// Comma-separated expressions up to (not including) `>`.
fn parse_angle_list(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    let mut items = Vec::new();
    if stream.check(TokenKind::CloseAngle) {
        return Ok(items);
    }
    loop {
        items.push(parse_expr(stream)?);
        if stream.eat(TokenKind::Comma).is_none() {
            return Ok(items);
        }
    }
}

/// A tuple of any delimiter pairing; newlines are allowed inside.
fn parse_tuple(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let open = stream.advance().expect("peeked");
    stream.skip_newlines();

    let mut items = Vec::new();
    if !closes_tuple(stream.peek_kind()) {
        loop {
            items.push(parse_expr(stream)?);
            stream.skip_newlines();
            if stream.eat(TokenKind::Comma).is_none() {
                break;
            }
            stream.skip_newlines();
        }
    }

    let close = match stream.peek_kind() {
        Some(TokenKind::CloseParen) | Some(TokenKind::CloseBracket) => {
            stream.advance().expect("peeked")
        }
        _ => {
            return Err(ParseError::expected_token(
                if open.kind == TokenKind::OpenParen {
                    TokenKind::CloseParen
                } else {
                    TokenKind::CloseBracket
                },
                stream.peek(),
                stream.current_span(),
            ))
        }
    };

    Ok(Expr::tuple(open, close, items))
}

fn closes_tuple(kind: Option<TokenKind>) -> bool {
    matches!(
        kind,
        Some(TokenKind::CloseParen) | Some(TokenKind::CloseBracket)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, TupleKind};
    use crate::lexer::lex;

    fn parse(source: &str) -> Expr {
        let (tokens, errors) = lex(source, 0);
        assert!(errors.is_empty(), "lex errors in {:?}", source);
        let mut stream = TokenStream::new(&tokens, 0);
        let expr = parse_expr(&mut stream).expect("parse");
        assert!(stream.at_end(), "leftover input in {:?}", source);
        expr
    }

    #[test]
    fn primaries() {
        assert!(matches!(parse("42").kind, ExprKind::Primary { .. }));
        assert!(matches!(parse("x").kind, ExprKind::Primary { .. }));
        assert!(matches!(parse(r"\T").kind, ExprKind::Primary { .. }));
    }

    #[test]
    fn juxtaposition_builds_apply() {
        let expr = parse("f x 3");
        let ExprKind::Apply { items } = &expr.kind else {
            panic!("expected apply");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(expr.to_string(), "f x 3");
    }

    #[test]
    fn single_primary_is_not_wrapped() {
        assert!(!matches!(parse("f").kind, ExprKind::Apply { .. }));
    }

    #[test]
    fn constraint_binds_loosest() {
        let expr = parse("f x : vec int");
        let ExprKind::Constraint { subject, constraint } = &expr.kind else {
            panic!("expected constraint");
        };
        assert!(matches!(subject.kind, ExprKind::Apply { .. }));
        assert!(matches!(constraint.kind, ExprKind::Apply { .. }));
        assert_eq!(expr.to_string(), "f x : vec int");
    }

    #[test]
    fn tuples_of_all_kinds() {
        for (source, kind) in [
            ("(a, b)", TupleKind::Open),
            ("[a, b]", TupleKind::Closed),
            ("(a, b]", TupleKind::OpenLeft),
            ("[a, b)", TupleKind::OpenRight),
        ] {
            let expr = parse(source);
            let ExprKind::Tuple { kind: k, items, .. } = &expr.kind else {
                panic!("expected tuple for {:?}", source);
            };
            assert_eq!(*k, kind, "{:?}", source);
            assert_eq!(items.len(), 2);
        }
    }

    #[test]
    fn empty_open_tuple() {
        let expr = parse("()");
        let ExprKind::Tuple { kind, items, .. } = &expr.kind else {
            panic!("expected tuple");
        };
        assert_eq!(*kind, TupleKind::Open);
        assert!(items.is_empty());
    }

    #[test]
    fn adjacent_angle_is_symbol_expression() {
        let expr = parse("vec<int, 3>");
        let ExprKind::Symbol {
            identifier, items, ..
        } = &expr.kind
        else {
            panic!("expected symbol expression");
        };
        assert_eq!(identifier.lexeme, "vec");
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn detached_angle_is_symbol_tuple() {
        let expr = parse("vec <int>");
        let ExprKind::Apply { items } = &expr.kind else {
            panic!("expected apply");
        };
        assert!(matches!(items[0].kind, ExprKind::Primary { .. }));
        let ExprKind::Symbol { identifier, .. } = &items[1].kind else {
            panic!("expected symbol tuple");
        };
        assert_eq!(identifier.kind, TokenKind::Undefined);
    }

    #[test]
    fn newlines_allowed_inside_tuples() {
        let expr = parse("(a,\n b,\n c)");
        let ExprKind::Tuple { items, .. } = &expr.kind else {
            panic!("expected tuple");
        };
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn missing_expression_is_reported() {
        let (tokens, _) = lex(":=", 0);
        let mut stream = TokenStream::new(&tokens, 0);
        assert!(parse_expr(&mut stream).is_err());
    }
}
