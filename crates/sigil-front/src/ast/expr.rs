//! Expression IR.
//!
//! Expressions come out of the parser with every `decl` reference unset;
//! resolution fills them in, rewriting nodes in place where the grammar is
//! more general than the resolved form (empty and single-element open
//! tuples, implicit applies). Every variant shares a small header: an
//! optional declaration reference and a list of attached constraint
//! expressions.
//!
//! The original design dispatched over variants with a shallow-apply
//! visitor; here that is a `match` on [`ExprKind`], which is all the
//! polymorphism the core needs.

use crate::ast::ids::DeclId;
use crate::lexer::{Token, TokenKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Delimiter shape of a tuple expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TupleKind {
    /// `( ... )`
    Open,
    /// `[ ... ]`
    Closed,
    /// `( ... ]`
    OpenLeft,
    /// `[ ... )`
    OpenRight,
}

/// Map delimiter tokens to a tuple kind.
///
/// # Panics
/// Panics on a pairing no tuple kind describes; the parser only constructs
/// legal pairings, so hitting this is a front-end bug.
pub fn tuple_kind(open: TokenKind, close: TokenKind) -> TupleKind {
    match (open, close) {
        (TokenKind::OpenParen, TokenKind::CloseParen) => TupleKind::Open,
        (TokenKind::OpenParen, TokenKind::CloseBracket) => TupleKind::OpenLeft,
        (TokenKind::OpenBracket, TokenKind::CloseParen) => TupleKind::OpenRight,
        (TokenKind::OpenBracket, TokenKind::CloseBracket) => TupleKind::Closed,
        _ => panic!("invalid tuple expression syntax: {:?} .. {:?}", open, close),
    }
}

/// Opening delimiter for printing.
pub fn tuple_open_str(kind: TupleKind) -> &'static str {
    match kind {
        TupleKind::Open | TupleKind::OpenLeft => "(",
        TupleKind::Closed | TupleKind::OpenRight => "[",
    }
}

/// Closing delimiter for printing.
pub fn tuple_close_str(kind: TupleKind) -> &'static str {
    match kind {
        TupleKind::Open | TupleKind::OpenRight => ")",
        TupleKind::Closed | TupleKind::OpenLeft => "]",
    }
}

/// An expression: variant plus the shared metadata header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    /// Resolved declaration reference, set during resolution
    pub decl: Option<DeclId>,
    /// Predicates attached after construction
    pub constraints: Vec<Expr>,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// A single token: identifier, free variable, or integer literal
    Primary { token: Token },
    /// Delimited sequence of expressions
    Tuple {
        kind: TupleKind,
        open: Token,
        close: Token,
        items: Vec<Expr>,
    },
    /// Juxtaposition, `f a b`. Holds at least one element.
    Apply { items: Vec<Expr> },
    /// Explicit symbol reference, `name<p1, p2>`.
    ///
    /// The identifier may be the `Undefined` sentinel for a symbol tuple
    /// `<f, a>`, in which case resolution promotes the first child to the
    /// identifier slot.
    Symbol {
        identifier: Token,
        open: Option<Token>,
        close: Option<Token>,
        items: Vec<Expr>,
    },
    /// `subject : constraint`
    Constraint {
        subject: Box<Expr>,
        constraint: Box<Expr>,
    },
}

impl Default for Expr {
    fn default() -> Self {
        Expr::primary(Token::undefined())
    }
}

impl Expr {
    fn with_kind(kind: ExprKind) -> Self {
        Self {
            kind,
            decl: None,
            constraints: Vec::new(),
        }
    }

    pub fn primary(token: Token) -> Self {
        Self::with_kind(ExprKind::Primary { token })
    }

    pub fn tuple(open: Token, close: Token, items: Vec<Expr>) -> Self {
        let kind = tuple_kind(open.kind, close.kind);
        Self::with_kind(ExprKind::Tuple {
            kind,
            open,
            close,
            items,
        })
    }

    /// An apply node. `items` must not be empty.
    pub fn apply(items: Vec<Expr>) -> Self {
        debug_assert!(!items.is_empty(), "apply must hold at least one child");
        Self::with_kind(ExprKind::Apply { items })
    }

    pub fn symbol(identifier: Token, items: Vec<Expr>) -> Self {
        Self::with_kind(ExprKind::Symbol {
            identifier,
            open: None,
            close: None,
            items,
        })
    }

    /// Symbol expression with its delimiter tokens, `name<a, b>`.
    pub fn symbol_delimited(
        identifier: Token,
        open: Token,
        close: Token,
        items: Vec<Expr>,
    ) -> Self {
        Self::with_kind(ExprKind::Symbol {
            identifier,
            open: Some(open),
            close: Some(close),
            items,
        })
    }

    /// Symbol tuple `<a, b>`: no identifier yet, promoted during resolution.
    pub fn symbol_tuple(open: Token, close: Token, items: Vec<Expr>) -> Self {
        Self::with_kind(ExprKind::Symbol {
            identifier: Token::undefined(),
            open: Some(open),
            close: Some(close),
            items,
        })
    }

    pub fn constraint(subject: Expr, constraint: Expr) -> Self {
        Self::with_kind(ExprKind::Constraint {
            subject: Box::new(subject),
            constraint: Box::new(constraint),
        })
    }

    pub fn add_constraint(&mut self, expr: Expr) {
        self.constraints.push(expr);
    }

    /// The leading token, for diagnostics.
    pub fn front(&self) -> &Token {
        match &self.kind {
            ExprKind::Primary { token } => token,
            ExprKind::Tuple { open, items, .. } => {
                if let Some(first) = items.first() {
                    first.front()
                } else {
                    open
                }
            }
            ExprKind::Apply { items } => items[0].front(),
            ExprKind::Symbol {
                identifier,
                open,
                items,
                ..
            } => {
                if identifier.kind != TokenKind::Undefined {
                    identifier
                } else if let Some(first) = items.first() {
                    first.front()
                } else if let Some(open) = open {
                    open
                } else {
                    identifier
                }
            }
            ExprKind::Constraint { subject, .. } => subject.front(),
        }
    }

    /// Patch every declaration reference through a clone map.
    ///
    /// References absent from the map point outside the cloned region and
    /// are kept as-is.
    pub fn remap_decls(&mut self, map: &HashMap<DeclId, DeclId>) {
        if let Some(decl) = self.decl {
            if let Some(new) = map.get(&decl) {
                self.decl = Some(*new);
            }
        }
        match &mut self.kind {
            ExprKind::Primary { .. } => {}
            ExprKind::Tuple { items, .. }
            | ExprKind::Apply { items }
            | ExprKind::Symbol { items, .. } => {
                for item in items {
                    item.remap_decls(map);
                }
            }
            ExprKind::Constraint {
                subject,
                constraint,
            } => {
                subject.remap_decls(map);
                constraint.remap_decls(map);
            }
        }
        for c in &mut self.constraints {
            c.remap_decls(map);
        }
    }

    /// Splice the children of any open-tuple child into this tuple.
    pub fn flatten_open_tuples(&mut self) {
        let ExprKind::Tuple { items, .. } = &mut self.kind else {
            return;
        };
        let mut flattened = Vec::with_capacity(items.len());
        for item in items.drain(..) {
            match item {
                Expr {
                    kind:
                        ExprKind::Tuple {
                            kind: TupleKind::Open,
                            items: inner,
                            ..
                        },
                    ..
                } => flattened.extend(inner),
                other => flattened.push(other),
            }
        }
        *items = flattened;
    }

    /// Splice the children of non-procedural apply children into this
    /// apply.
    ///
    /// An apply child is procedural — and kept intact — when it resolved
    /// to a procedure, or its head did, or its head is an explicit symbol
    /// expression. `is_procedure` reports whether a declaration reference
    /// names a procedure; the IR itself cannot tell.
    pub fn flatten_applies(&mut self, is_procedure: &dyn Fn(DeclId) -> bool) {
        let ExprKind::Apply { items } = &mut self.kind else {
            return;
        };
        let mut flattened = Vec::with_capacity(items.len());
        for item in items.drain(..) {
            let procedural = match &item.kind {
                ExprKind::Apply { items: inner } => {
                    let head = match &inner[0].kind {
                        ExprKind::Primary { .. } => {
                            inner[0].decl.map(|d| is_procedure(d)).unwrap_or(false)
                        }
                        ExprKind::Symbol { .. } => true,
                        _ => false,
                    };
                    head || item.decl.map(|d| is_procedure(d)).unwrap_or(false)
                }
                _ => true,
            };
            match item {
                Expr {
                    kind: ExprKind::Apply { items: inner },
                    ..
                } if !procedural => flattened.extend(inner),
                other => flattened.push(other),
            }
        }
        *items = flattened;
    }
}

/// Walk an expression and bind every still-unbound free-variable primary
/// through `bind`, which maps the token to a symbol-variable declaration.
pub fn bind_free_variables(expr: &mut Expr, bind: &mut dyn FnMut(&Token) -> DeclId) {
    match &mut expr.kind {
        ExprKind::Primary { token } => {
            if token.kind == TokenKind::FreeVariable && expr.decl.is_none() {
                expr.decl = Some(bind(token));
            }
        }
        ExprKind::Tuple { items, .. }
        | ExprKind::Apply { items }
        | ExprKind::Symbol { items, .. } => {
            for item in items {
                bind_free_variables(item, bind);
            }
        }
        ExprKind::Constraint {
            subject,
            constraint,
        } => {
            bind_free_variables(subject, bind);
            bind_free_variables(constraint, bind);
        }
    }
    for c in &mut expr.constraints {
        bind_free_variables(c, bind);
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Primary { token } => write!(f, "{}", token.lexeme),
            ExprKind::Tuple { kind, items, .. } => {
                write!(f, "{}", tuple_open_str(*kind))?;
                write_list(f, items)?;
                write!(f, "{}", tuple_close_str(*kind))
            }
            ExprKind::Apply { items } => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    let group = matches!(item.kind, ExprKind::Apply { .. });
                    if group {
                        write!(f, "({})", item)?;
                    } else {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
            ExprKind::Symbol {
                identifier, items, ..
            } => {
                if identifier.kind != TokenKind::Undefined {
                    write!(f, "{}", identifier.lexeme)?;
                }
                if !items.is_empty() {
                    write!(f, "<")?;
                    write_list(f, items)?;
                    write!(f, ">")
                } else if identifier.kind == TokenKind::Undefined {
                    write!(f, "<>")
                } else {
                    Ok(())
                }
            }
            ExprKind::Constraint {
                subject,
                constraint,
            } => write!(f, "{} : {}", subject, constraint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::Span;

    fn ident(name: &str) -> Token {
        Token::new(TokenKind::Identifier, name, Span::zero(0))
    }

    fn free(name: &str) -> Token {
        Token::new(TokenKind::FreeVariable, name, Span::zero(0))
    }

    fn open() -> Token {
        Token::new(TokenKind::OpenParen, "(", Span::zero(0))
    }

    fn close() -> Token {
        Token::new(TokenKind::CloseParen, ")", Span::zero(0))
    }

    #[test]
    fn tuple_kind_pairings() {
        assert_eq!(
            tuple_kind(TokenKind::OpenParen, TokenKind::CloseParen),
            TupleKind::Open
        );
        assert_eq!(
            tuple_kind(TokenKind::OpenBracket, TokenKind::CloseBracket),
            TupleKind::Closed
        );
        assert_eq!(
            tuple_kind(TokenKind::OpenParen, TokenKind::CloseBracket),
            TupleKind::OpenLeft
        );
        assert_eq!(
            tuple_kind(TokenKind::OpenBracket, TokenKind::CloseParen),
            TupleKind::OpenRight
        );
    }

    #[test]
    #[should_panic(expected = "invalid tuple expression syntax")]
    fn tuple_kind_rejects_non_delimiters() {
        let _ = tuple_kind(TokenKind::OpenParen, TokenKind::CloseAngle);
    }

    #[test]
    fn front_walks_into_children() {
        let apply = Expr::apply(vec![
            Expr::primary(ident("f")),
            Expr::primary(ident("a")),
        ]);
        assert_eq!(apply.front().lexeme, "f");

        let tuple = Expr::tuple(open(), close(), vec![]);
        assert_eq!(tuple.front().kind, TokenKind::OpenParen);

        let sym = Expr::symbol_tuple(open(), close(), vec![Expr::primary(ident("g"))]);
        assert_eq!(sym.front().lexeme, "g");

        let constraint =
            Expr::constraint(Expr::primary(ident("x")), Expr::primary(ident("T")));
        assert_eq!(constraint.front().lexeme, "x");
    }

    #[test]
    fn display_round_trips_shapes() {
        let e = Expr::apply(vec![
            Expr::primary(ident("f")),
            Expr::tuple(
                open(),
                close(),
                vec![Expr::primary(ident("a")), Expr::primary(ident("b"))],
            ),
        ]);
        assert_eq!(e.to_string(), "f (a, b)");

        let s = Expr::symbol(
            ident("vec"),
            vec![Expr::primary(ident("int")), Expr::primary(ident("n"))],
        );
        assert_eq!(s.to_string(), "vec<int, n>");

        let c = Expr::constraint(Expr::primary(ident("x")), Expr::primary(ident("T")));
        assert_eq!(c.to_string(), "x : T");
    }

    #[test]
    fn nested_applies_print_grouped() {
        let inner = Expr::apply(vec![
            Expr::primary(ident("g")),
            Expr::primary(ident("x")),
        ]);
        let outer = Expr::apply(vec![Expr::primary(ident("f")), inner]);
        assert_eq!(outer.to_string(), "f (g x)");
    }

    #[test]
    fn remap_patches_only_mapped_refs() {
        let mut e = Expr::primary(ident("x"));
        e.decl = Some(DeclId::new(1));
        let mut other = Expr::primary(ident("y"));
        other.decl = Some(DeclId::new(9));
        let mut apply = Expr::apply(vec![e, other]);

        let mut map = HashMap::new();
        map.insert(DeclId::new(1), DeclId::new(5));
        apply.remap_decls(&map);

        let ExprKind::Apply { items } = &apply.kind else {
            unreachable!()
        };
        assert_eq!(items[0].decl, Some(DeclId::new(5)));
        assert_eq!(items[1].decl, Some(DeclId::new(9)));
    }

    #[test]
    fn flatten_open_tuples_splices_in_place() {
        let inner = Expr::tuple(
            open(),
            close(),
            vec![Expr::primary(ident("b")), Expr::primary(ident("c"))],
        );
        let mut outer = Expr::tuple(
            open(),
            close(),
            vec![Expr::primary(ident("a")), inner, Expr::primary(ident("d"))],
        );
        outer.flatten_open_tuples();
        assert_eq!(outer.to_string(), "(a, b, c, d)");
    }

    #[test]
    fn flatten_applies_keeps_procedure_calls() {
        let proc_id = DeclId::new(1);
        let mut head = Expr::primary(ident("f"));
        head.decl = Some(proc_id);
        let call = Expr::apply(vec![head, Expr::primary(ident("x"))]);

        let mut plain_head = Expr::primary(ident("g"));
        plain_head.decl = Some(DeclId::new(2));
        let plain = Expr::apply(vec![plain_head, Expr::primary(ident("y"))]);

        let mut outer = Expr::apply(vec![Expr::primary(ident("h")), call, plain]);
        outer.flatten_applies(&|d| d == proc_id);

        // `f x` survives intact, `g y` is spliced.
        assert_eq!(outer.to_string(), "h (f x) g y");
    }

    #[test]
    fn flatten_applies_keeps_resolved_and_explicit_calls() {
        let proc_id = DeclId::new(1);

        // apply bound to a procedure overload, head itself unresolved
        let mut bound = Expr::apply(vec![
            Expr::primary(ident("f")),
            Expr::primary(ident("x")),
        ]);
        bound.decl = Some(proc_id);

        // apply headed by an explicit symbol expression
        let explicit = Expr::apply(vec![
            Expr::symbol(ident("g"), vec![Expr::primary(ident("a"))]),
            Expr::primary(ident("y")),
        ]);

        let mut outer = Expr::apply(vec![Expr::primary(ident("h")), bound, explicit]);
        outer.flatten_applies(&|d| d == proc_id);

        assert_eq!(outer.to_string(), "h (f x) (g<a> y)");
    }

    #[test]
    fn binds_free_variables_once() {
        let mut e = Expr::apply(vec![
            Expr::primary(free("T")),
            Expr::primary(ident("x")),
            Expr::primary(free("T")),
        ]);
        let mut calls = 0;
        bind_free_variables(&mut e, &mut |_| {
            calls += 1;
            DeclId::new(0)
        });
        assert_eq!(calls, 2);

        // Already-bound primaries are left alone.
        bind_free_variables(&mut e, &mut |_| {
            calls += 1;
            DeclId::new(0)
        });
        assert_eq!(calls, 2);
    }
}
