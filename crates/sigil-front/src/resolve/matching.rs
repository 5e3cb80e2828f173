//! The three structural matching relations on parameter lists.
//!
//! In increasing looseness:
//!
//! 1. **Equivalence** — structural equality that treats any two symbol
//!    variables as interchangeable. Detects redefinitions and keys the
//!    instantiation cache.
//! 2. **Pattern match** — a one-sided filter: left symbol variables accept
//!    any right primary, everything else must agree lexically.
//! 3. **Value match** — unification: symbol variables on either side
//!    absorb the opposing expression into a binding set.
//!
//! Equivalence and pattern matching compare lexemes on non-variable
//! primaries, so both are sensitive to lexical identity rather than
//! declaration identity; value matching compares resolved declarations.

use crate::ast::scope::{bind, BindingSet};
use crate::ast::{DeclBody, DeclId, Expr, ExprKind, ModuleSet};

/// The symbol variable an expression resolves to, if any.
pub fn symbol_variable_of(world: &ModuleSet, expr: &Expr) -> Option<DeclId> {
    let decl = expr.decl?;
    match world.decl(decl).body {
        DeclBody::SymbolVariable { .. } => Some(decl),
        _ => None,
    }
}

/// Follow symbol-variable binding chains to the underlying expression.
pub fn resolve_indirections<'a>(world: &'a ModuleSet, expr: &'a Expr) -> &'a Expr {
    let mut current = expr;
    loop {
        let Some(decl) = current.decl else {
            return current;
        };
        match &world.decl(decl).body {
            DeclBody::SymbolVariable {
                bound: Some(bound), ..
            } => current = bound,
            _ => return current,
        }
    }
}

/// True when every variable of `decl`'s symbol is bound and every binding
/// resolves, through indirections, to a declared expression.
pub fn symbol_is_concrete(world: &ModuleSet, decl: DeclId) -> bool {
    for variable in &world.decl(decl).symbol.variables {
        let Some(bound) = world.symbol_variable_binding(*variable) else {
            return false;
        };
        let target = resolve_indirections(world, bound);
        let Some(target_decl) = target.decl else {
            return false;
        };
        if let DeclBody::SymbolVariable { bound: None, .. } = world.decl(target_decl).body {
            return false;
        }
    }
    true
}

/// Equivalence match (relation 1).
pub fn match_equivalent(world: &ModuleSet, lhs: &Expr, rhs: &Expr) -> bool {
    match (&lhs.kind, &rhs.kind) {
        (ExprKind::Primary { token: lt }, ExprKind::Primary { token: rt }) => {
            let both_variables = symbol_variable_of(world, lhs).is_some()
                && symbol_variable_of(world, rhs).is_some();
            both_variables || lt.lexeme == rt.lexeme
        }
        (
            ExprKind::Tuple {
                kind: lk,
                items: li,
                ..
            },
            ExprKind::Tuple {
                kind: rk,
                items: ri,
                ..
            },
        ) => lk == rk && match_equivalent_lists(world, li, ri),
        (
            ExprKind::Symbol {
                identifier: li,
                items: lis,
                ..
            },
            ExprKind::Symbol {
                identifier: ri,
                items: ris,
                ..
            },
        ) => li.lexeme == ri.lexeme && match_equivalent_lists(world, lis, ris),
        (ExprKind::Apply { items: li }, ExprKind::Apply { items: ri }) => {
            match_equivalent_lists(world, li, ri)
        }
        (
            ExprKind::Constraint { subject: ls, .. },
            ExprKind::Constraint { subject: rs, .. },
        ) => match_equivalent(world, ls, rs),
        (ExprKind::Constraint { subject, .. }, _) => match_equivalent(world, subject, rhs),
        (_, ExprKind::Constraint { subject, .. }) => match_equivalent(world, lhs, subject),
        _ => false,
    }
}

/// Element-wise equivalence of two parameter lists.
pub fn match_equivalent_lists(world: &ModuleSet, lhs: &[Expr], rhs: &[Expr]) -> bool {
    lhs.len() == rhs.len()
        && lhs
            .iter()
            .zip(rhs)
            .all(|(l, r)| match_equivalent(world, l, r))
}

/// Pattern match (relation 2).
pub fn match_pattern(world: &ModuleSet, lhs: &Expr, rhs: &Expr) -> bool {
    match (&lhs.kind, &rhs.kind) {
        (ExprKind::Primary { token: lt }, _) => {
            if symbol_variable_of(world, lhs).is_some() {
                matches!(rhs.kind, ExprKind::Primary { .. })
            } else if let ExprKind::Primary { token: rt } = &rhs.kind {
                lt.lexeme == rt.lexeme
            } else {
                false
            }
        }
        (
            ExprKind::Tuple {
                kind: lk,
                items: li,
                ..
            },
            ExprKind::Tuple {
                kind: rk,
                items: ri,
                ..
            },
        ) => {
            lk == rk
                && li.len() == ri.len()
                && li.iter().zip(ri).all(|(l, r)| match_pattern(world, l, r))
        }
        _ => false,
    }
}

/// Element-wise pattern match of two parameter lists.
pub fn match_pattern_lists(world: &ModuleSet, lhs: &[Expr], rhs: &[Expr]) -> bool {
    lhs.len() == rhs.len()
        && lhs.iter().zip(rhs).all(|(l, r)| match_pattern(world, l, r))
}

/// Value-match state (relation 3): bindings absorbed from each side.
#[derive(Debug, Default)]
pub struct ValueMatcher {
    /// Left-side symbol variables bound to right-side expressions
    pub left: BindingSet,
    /// Right-side symbol variables bound to left-side expressions
    pub right: BindingSet,
}

impl ValueMatcher {
    /// Unify two expressions, absorbing variables into the binding sets.
    pub fn match_value(&mut self, world: &ModuleSet, lhs: &Expr, rhs: &Expr) -> bool {
        let left_var = symbol_variable_of(world, lhs);
        let right_var = symbol_variable_of(world, rhs);

        if let Some(variable) = left_var {
            if right_var.is_some() {
                return true;
            }
            bind(&mut self.left, variable, rhs.clone());
            return true;
        }
        if let Some(variable) = right_var {
            bind(&mut self.right, variable, lhs.clone());
            return true;
        }

        match (&lhs.kind, &rhs.kind) {
            (ExprKind::Primary { .. }, ExprKind::Primary { .. })
            | (ExprKind::Symbol { .. }, ExprKind::Symbol { .. }) => {
                lhs.decl.is_some() && lhs.decl == rhs.decl
            }
            (
                ExprKind::Tuple {
                    kind: lk,
                    items: li,
                    ..
                },
                ExprKind::Tuple {
                    kind: rk,
                    items: ri,
                    ..
                },
            ) => {
                lk == rk
                    && li.len() == ri.len()
                    && li
                        .iter()
                        .zip(ri)
                        .all(|(l, r)| self.match_value(world, l, r))
            }
            (
                ExprKind::Constraint { subject: ls, .. },
                ExprKind::Constraint { subject: rs, .. },
            ) => self.match_value(world, ls, rs),
            (ExprKind::Constraint { subject, .. }, _) => {
                self.match_value(world, subject, rhs)
            }
            (_, ExprKind::Constraint { subject, .. }) => {
                self.match_value(world, lhs, subject)
            }
            _ => false,
        }
    }

    /// Unify two parameter lists element-wise.
    pub fn match_value_lists(
        &mut self,
        world: &ModuleSet,
        lhs: &[Expr],
        rhs: &[Expr],
    ) -> bool {
        lhs.len() == rhs.len()
            && lhs
                .iter()
                .zip(rhs)
                .all(|(l, r)| self.match_value(world, l, r))
    }
}

/// Element-wise equivalence of two binding sets, for the instantiation
/// cache.
pub fn bindings_equivalent(world: &ModuleSet, lhs: &BindingSet, rhs: &BindingSet) -> bool {
    lhs.len() == rhs.len()
        && lhs
            .iter()
            .zip(rhs)
            .all(|((lk, lv), (rk, rv))| lk == rk && match_equivalent(world, lv, rv))
}
