//! The resolution driver.
//!
//! [`Context`] owns the diagnostics sink, the active [`Resolver`], and the
//! rewrite slot. Expression resolution is bottom-up with in-place
//! rewriting: a variant's handler may stash a replacement expression in
//! the slot, and [`Context::resolve_expr`] keeps swapping the replacement
//! into the slot and re-resolving until the slot stays empty. Each rewrite
//! replaces the expression with a different variant shape, so the loop is
//! bounded by the node count.
//!
//! Expressions handed to the driver must be detached from the module-set
//! arenas (taken out of their owning declaration or scope) for the
//! duration of the call; instantiation appends to the arenas mid-flight.

use crate::ast::{Expr, ExprKind, ModuleSet, TupleKind};
use crate::error::{Diagnostic, Diagnostics, ErrorKind};
use crate::foundation::Span;
use crate::lexer::{Token, TokenKind};
use crate::resolve::instantiate::instantiate;
use crate::resolve::resolver::{find_value_plan, LookupHit, Resolver, ValuePlan};

/// Resolution driver state.
pub struct Context<'a> {
    pub world: &'a mut ModuleSet,
    pub dgn: &'a mut Diagnostics,
    pub resolver: Resolver,
    rewrite: Option<Expr>,
}

impl<'a> Context<'a> {
    pub fn new(world: &'a mut ModuleSet, dgn: &'a mut Diagnostics, resolver: Resolver) -> Self {
        Self {
            world,
            dgn,
            resolver,
            rewrite: None,
        }
    }

    /// Report an error; the returned diagnostic accepts `see` labels.
    pub fn error(
        &mut self,
        kind: ErrorKind,
        span: Span,
        message: impl Into<String>,
    ) -> &mut Diagnostic {
        self.dgn.error(kind, span, message)
    }

    /// Request replacement of the expression currently being resolved.
    pub fn rewrite(&mut self, expr: Expr) {
        debug_assert!(self.rewrite.is_none(), "rewrite slot already occupied");
        self.rewrite = Some(expr);
    }

    /// Resolve the expression in `slot`, applying rewrites until none are
    /// requested.
    pub fn resolve_expr(&mut self, slot: &mut Expr) {
        self.rewrite = None;
        resolve_once(self, slot);
        while let Some(replacement) = self.rewrite.take() {
            *slot = replacement;
            resolve_once(self, slot);
        }
    }

    /// Resolve a list of expressions in order.
    pub fn resolve_exprs(&mut self, exprs: &mut [Expr]) {
        for expr in exprs {
            self.resolve_expr(expr);
        }
    }

    /// Value lookup of `name<params>` through the active resolver.
    ///
    /// A miss on a completely unknown bare name under a failover resolver
    /// creates a fresh symbol variable instead.
    pub fn match_value(&mut self, name: &Token, params: &[Expr]) -> LookupHit {
        let plan = find_value_plan(self.world, &self.resolver, &name.lexeme, params, false);
        match plan {
            ValuePlan::Hit { decl, set } => LookupHit {
                decl: Some(decl),
                set,
            },
            ValuePlan::Instantiate {
                set,
                proto_index,
                bindings,
            } => {
                let instance = instantiate(self.world, self.dgn, &set, proto_index, bindings);
                LookupHit {
                    decl: Some(instance.instance.unwrap_or(instance.prototype)),
                    set: Some(set),
                }
            }
            ValuePlan::Miss { set } => {
                if set.is_none() && params.is_empty() {
                    if let Some(owner) = self.resolver.failover {
                        let variable = self.world.create_symbol_variable(owner, name);
                        return LookupHit {
                            decl: Some(variable),
                            set: None,
                        };
                    }
                }
                LookupHit { decl: None, set }
            }
        }
    }

    /// Equivalence lookup of `name<params>`: the hierarchically nearest
    /// prototype declared with an equivalent parameter list.
    pub fn match_equivalent(&self, name: &str, params: &[Expr]) -> Option<crate::ast::DeclId> {
        let mut scope = Some(self.resolver.scope);
        while let Some(current) = scope {
            if let Some(set) = self.world.scope(current).symbol_set(name) {
                if let Some(decl) = set.find_equivalent(self.world, params) {
                    return Some(decl);
                }
            }
            scope = self.world.scope(current).parent;
        }
        let module = self.resolver.module(self.world);
        for import in &self.world.module(module).imports {
            let root = self.world.module(*import).root;
            if let Some(set) = self.world.scope(root).symbol_set(name) {
                if let Some(decl) = set.find_equivalent(self.world, params) {
                    return Some(decl);
                }
            }
        }
        None
    }

    /// Procedure-overload lookup of `name` applied to `params`.
    pub fn match_procedure(&mut self, name: &Token, params: &[Expr]) -> LookupHit {
        let plan = find_value_plan(self.world, &self.resolver, &name.lexeme, params, true);
        match plan {
            ValuePlan::Hit { decl, set } => LookupHit {
                decl: Some(decl),
                set,
            },
            ValuePlan::Instantiate {
                set,
                proto_index,
                bindings,
            } => {
                let instance = instantiate(self.world, self.dgn, &set, proto_index, bindings);
                LookupHit {
                    decl: Some(instance.instance.unwrap_or(instance.prototype)),
                    set: Some(set),
                }
            }
            ValuePlan::Miss { set } => LookupHit { decl: None, set },
        }
    }
}

fn resolve_once(ctx: &mut Context, expr: &mut Expr) {
    if matches!(expr.kind, ExprKind::Primary { .. }) {
        resolve_primary(ctx, expr);
    } else if matches!(expr.kind, ExprKind::Tuple { .. }) {
        resolve_tuple(ctx, expr);
    } else if matches!(expr.kind, ExprKind::Apply { .. }) {
        resolve_apply(ctx, expr);
    } else if matches!(expr.kind, ExprKind::Symbol { .. }) {
        resolve_symbol_expr(ctx, expr);
    } else {
        resolve_constraint(ctx, expr);
    }

    // Attached constraints resolve with the expression; a rewrite discards
    // the node, constraints included.
    if ctx.rewrite.is_none() && !expr.constraints.is_empty() {
        let mut constraints = std::mem::take(&mut expr.constraints);
        ctx.resolve_exprs(&mut constraints);
        expr.constraints = constraints;
    }
}

fn resolve_primary(ctx: &mut Context, expr: &mut Expr) {
    let token = match &expr.kind {
        ExprKind::Primary { token } => token.clone(),
        _ => unreachable!(),
    };

    match token.kind {
        TokenKind::FreeVariable => {
            // Symbol-parameter resolution binds these; anywhere else is an
            // error.
            if expr.decl.is_none() {
                ctx.error(
                    ErrorKind::UnboundFreeVariable,
                    token.span,
                    "free variable not expected in this context",
                );
            }
        }
        TokenKind::Integer => {
            expr.decl = Some(ctx.world.integer_type());
        }
        TokenKind::Identifier => {
            // A primary already bound to a symbol variable is a
            // free-variable hole created during symbol-parameter
            // resolution; it stays bound.
            if let Some(decl) = expr.decl {
                if matches!(
                    ctx.world.decl(decl).body,
                    crate::ast::DeclBody::SymbolVariable { .. }
                ) {
                    return;
                }
            }
            let hit = ctx.match_value(&token, &[]);
            match hit.decl {
                Some(decl) => expr.decl = Some(decl),
                None => {
                    if hit.set.is_none() {
                        ctx.error(
                            ErrorKind::UndeclaredIdentifier,
                            token.span,
                            format!("undeclared identifier '{}'", token.lexeme),
                        );
                    }
                }
            }
        }
        _ => {}
    }
}

fn resolve_tuple(ctx: &mut Context, expr: &mut Expr) {
    {
        let ExprKind::Tuple { items, .. } = &mut expr.kind else {
            unreachable!()
        };
        ctx.resolve_exprs(items);
    }

    // Open-tuple children splice into their parent.
    expr.flatten_open_tuples();

    let ExprKind::Tuple {
        kind, open, items, ..
    } = &mut expr.kind
    else {
        unreachable!()
    };
    if *kind != TupleKind::Open {
        return;
    }

    if items.is_empty() {
        let mut unit = Expr::primary(open.clone());
        unit.decl = Some(ctx.world.empty_type());
        ctx.rewrite(unit);
    } else if items.len() == 1 {
        let child = items.remove(0);
        ctx.rewrite(child);
    }
}

fn resolve_apply(ctx: &mut Context, expr: &mut Expr) {
    {
        let ExprKind::Apply { items } = &mut expr.kind else {
            unreachable!()
        };
        ctx.resolve_exprs(items);
    }

    // Splice apply children that resolved to nothing procedural.
    {
        let world = &*ctx.world;
        expr.flatten_applies(&|decl| world.decl(decl).is_procedure());
    }

    let (len, head_token) = {
        let ExprKind::Apply { items } = &expr.kind else {
            unreachable!()
        };
        // An explicit symbol-expression head is already a resolved lookup.
        if matches!(items[0].kind, ExprKind::Symbol { .. }) {
            return;
        }
        let head_token = match &items[0].kind {
            ExprKind::Primary { token } => Some(token.clone()),
            _ => None,
        };
        (items.len(), head_token)
    };

    // Defer applies headed by a free variable until instantiation makes
    // them concrete.
    if let Some(token) = &head_token {
        if token.kind == TokenKind::FreeVariable {
            return;
        }
    }

    // No arguments, nothing to apply: the apply is its sole child.
    if len == 1 {
        let ExprKind::Apply { items } = &mut expr.kind else {
            unreachable!()
        };
        let child = items.remove(0);
        ctx.rewrite(child);
        return;
    }

    let head = match head_token {
        Some(token) if token.kind == TokenKind::Identifier => token,
        _ => {
            let span = expr.front().span;
            ctx.error(
                ErrorKind::ImplicitApplyNeedsIdentifier,
                span,
                "implicit procedure application must begin with an identifier",
            );
            return;
        }
    };

    // Hit on a symbol: transmute the apply into a symbol expression over
    // the same children.
    let hit = {
        let ExprKind::Apply { items } = &expr.kind else {
            unreachable!()
        };
        ctx.match_value(&head, &items[1..])
    };
    if hit.is_hit() {
        let ExprKind::Apply { items } = &mut expr.kind else {
            unreachable!()
        };
        let mut children = std::mem::take(items);
        children.remove(0);
        ctx.rewrite(Expr::symbol(head, children));
        return;
    }

    // Fall back to procedure overloads.
    let proc_hit = {
        let ExprKind::Apply { items } = &expr.kind else {
            unreachable!()
        };
        ctx.match_procedure(&head, &items[1..])
    };
    if let Some(decl) = proc_hit.decl {
        if ctx.world.decl(decl).is_procedure() {
            expr.decl = Some(decl);
            return;
        }
    }

    let span = expr.front().span;
    let mut cited = Vec::new();
    for set_ref in hit.set.iter().chain(proc_hit.set.iter()) {
        let scope = ctx.world.scope(set_ref.scope);
        let set = if set_ref.overloads {
            scope.overload_set(&set_ref.name)
        } else {
            scope.symbol_set(&set_ref.name)
        };
        if let Some(set) = set {
            for template in set.prototypes() {
                if !cited.contains(&template.declaration) {
                    cited.push(template.declaration);
                }
            }
        }
    }
    let candidates: Vec<_> = cited.iter().map(|d| ctx.world.see_label(*d)).collect();

    let err = ctx.error(
        ErrorKind::NoMatchingOverload,
        span,
        "does not match any symbol declarations or procedure overloads",
    );
    for label in candidates {
        err.see(label.span, label.message);
    }
}

fn resolve_symbol_expr(ctx: &mut Context, expr: &mut Expr) {
    // A symbol tuple names its symbol with its first child.
    {
        let ExprKind::Symbol {
            identifier, items, ..
        } = &mut expr.kind
        else {
            unreachable!()
        };
        if identifier.kind == TokenKind::Undefined {
            if items.is_empty() {
                return;
            }
            if !matches!(items[0].kind, ExprKind::Primary { .. }) {
                let span = items[0].front().span;
                ctx.error(
                    ErrorKind::SymbolTupleNeedsIdentifier,
                    span,
                    "symbol tuples must start with an identifier",
                );
                return;
            }
            let first = items.remove(0);
            let ExprKind::Primary { token } = first.kind else {
                unreachable!()
            };
            *identifier = token;
        }
    }

    {
        let ExprKind::Symbol { items, .. } = &mut expr.kind else {
            unreachable!()
        };
        ctx.resolve_exprs(items);
    }

    // Every child must have resolved before the set lookup makes sense.
    let before = ctx.dgn.error_count();
    {
        let ExprKind::Symbol { items, .. } = &expr.kind else {
            unreachable!()
        };
        for item in items {
            enforce_resolution(ctx, item);
        }
    }
    if ctx.dgn.error_count() > before {
        return;
    }

    let identifier = {
        let ExprKind::Symbol { identifier, .. } = &expr.kind else {
            unreachable!()
        };
        identifier.clone()
    };
    let hit = {
        let ExprKind::Symbol { items, .. } = &expr.kind else {
            unreachable!()
        };
        ctx.match_value(&identifier, items)
    };
    match hit.decl {
        Some(decl) => expr.decl = Some(decl),
        None => {
            ctx.error(
                ErrorKind::UndeclaredSymbol,
                identifier.span,
                format!("undeclared symbol '{}'", identifier.lexeme),
            );
        }
    }
}

fn resolve_constraint(ctx: &mut Context, expr: &mut Expr) {
    let ExprKind::Constraint {
        subject,
        constraint,
    } = &mut expr.kind
    else {
        unreachable!()
    };
    ctx.resolve_expr(subject);
    ctx.resolve_expr(constraint);
}

/// Report identifier-bearing sub-expressions that did not resolve.
///
/// Used as a gate: callers compare the error count before and after, and
/// skip dependent operations when it grew.
pub fn enforce_resolution(ctx: &mut Context, expr: &Expr) {
    match &expr.kind {
        ExprKind::Primary { token } => {
            if token.kind == TokenKind::Identifier && expr.decl.is_none() {
                ctx.error(
                    ErrorKind::UndeclaredIdentifier,
                    token.span,
                    format!("'{}' does not identify a declaration", token.lexeme),
                );
            }
        }
        ExprKind::Tuple { items, .. }
        | ExprKind::Apply { items }
        | ExprKind::Symbol { items, .. } => {
            for item in items {
                enforce_resolution(ctx, item);
            }
        }
        ExprKind::Constraint {
            subject,
            constraint,
        } => {
            enforce_resolution(ctx, subject);
            enforce_resolution(ctx, constraint);
        }
    }
}
