//! Scope and declaration resolution.
//!
//! A scope resolves in two passes. The first pass resolves every
//! declaration's symbol parameters (turning stray names into symbol
//! variables), checks the name's symbol set for an equivalent prototype
//! (redefinition), registers the prototype, and resolves non-procedure
//! declarations inline. Procedures defer to a second pass so their bodies
//! see every sibling prototype.
//!
//! Declarations produced by template instantiation join a scope after its
//! symbol pass; they are reachable through their prototype's instance
//! cache and are skipped here.

use crate::ast::scope::BindingSet;
use crate::ast::{DeclBody, DeclId, DeclKind, ModuleId, ModuleSet, ScopeId, ScopeKind, SymbolSet};
use crate::error::{Diagnostics, ErrorKind};
use crate::resolve::context::Context;
use crate::resolve::resolver::Resolver;
use std::collections::HashSet;
use std::mem;

/// Resolve every module in the set: imports first, then symbols in
/// dependency order.
pub fn resolve_module_set(world: &mut ModuleSet, dgn: &mut Diagnostics) {
    let modules: Vec<ModuleId> = world.module_ids().collect();
    for module in &modules {
        if *module != world.axioms() {
            resolve_imports(world, dgn, *module);
        }
    }

    let mut done = HashSet::new();
    done.insert(world.axioms());
    for module in modules {
        resolve_module(world, dgn, module, &mut done);
    }
}

fn resolve_module(
    world: &mut ModuleSet,
    dgn: &mut Diagnostics,
    module: ModuleId,
    done: &mut HashSet<ModuleId>,
) {
    if !done.insert(module) {
        return;
    }
    let imports = world.module(module).imports.clone();
    for import in imports {
        resolve_module(world, dgn, import, done);
    }

    tracing::debug!(module = %world.module(module).name, "resolving symbols");
    let root = world.module(module).root;
    resolve_scope(world, dgn, root);
}

/// Scan a module's root scope for import declarations and record them.
pub fn resolve_imports(world: &mut ModuleSet, dgn: &mut Diagnostics, module: ModuleId) {
    let root = world.module(module).root;
    let decls = world.scope(root).declarations.clone();
    for decl in decls {
        if world.decl(decl).kind() != DeclKind::Import {
            continue;
        }
        let token = world.decl(decl).identifier().clone();
        match world.find_module(&token.lexeme) {
            Some(target) if target != module => {
                if !world.module(module).imports.contains(&target) {
                    tracing::debug!(
                        module = %world.module(module).name,
                        import = %token.lexeme,
                        "import resolved"
                    );
                    world.module_mut(module).imports.push(target);
                }
            }
            Some(_) => {}
            None => {
                dgn.error(
                    ErrorKind::UnknownModule,
                    token.span,
                    format!("module '{}' not found", token.lexeme),
                );
            }
        }
    }
}

/// Resolve one scope's declarations.
pub fn resolve_scope(world: &mut ModuleSet, dgn: &mut Diagnostics, scope: ScopeId) {
    let module = world.scope(scope).module;
    let decls = world.scope(scope).declarations.clone();
    let mut procedures = Vec::new();

    for decl in decls {
        if world.is_template_instance(module, decl) {
            continue;
        }

        resolve_symbol_of(world, dgn, decl, scope);

        let name = world.decl(decl).name().to_string();
        let params = world.decl(decl).symbol.parameters.clone();

        let existing = world
            .scope(scope)
            .symbol_set(&name)
            .and_then(|set| set.find_equivalent(world, &params));
        match existing {
            Some(other) if other != decl => {
                let span = world.decl(decl).identifier().span;
                let label = world.see_label(other);
                dgn.error(
                    ErrorKind::SymbolRedefinition,
                    span,
                    format!("'{}' is already defined", name),
                )
                .see(label.span, label.message);
                continue;
            }
            Some(_) => {}
            None => {
                let set = world
                    .scope_mut(scope)
                    .symbols
                    .entry(name.clone())
                    .or_insert_with(|| SymbolSet::new(scope, &name));
                set.append(params.clone(), decl);
            }
        }

        if world.decl(decl).is_procedure() {
            let set = world
                .scope_mut(scope)
                .procedure_overloads
                .entry(name.clone())
                .or_insert_with(|| SymbolSet::new(scope, &name));
            if !set.contains(decl) {
                set.append(params, decl);
            }
            procedures.push(decl);
        } else {
            resolve_decl(world, dgn, decl);
        }
    }

    for procedure in procedures {
        resolve_decl(world, dgn, procedure);
    }
}

/// Resolve a declaration's symbol parameters.
///
/// Free-variable primaries become symbol variables (reusing same-named
/// ones), then the parameters resolve under a failover resolver that
/// turns any remaining unknown bare name into a fresh variable.
pub fn resolve_symbol_of(
    world: &mut ModuleSet,
    dgn: &mut Diagnostics,
    decl: DeclId,
    scope: ScopeId,
) {
    let mut params = mem::take(&mut world.decl_mut(decl).symbol.parameters);
    for param in &mut params {
        crate::ast::bind_free_variables(param, &mut |token| {
            world.create_symbol_variable(decl, token)
        });
    }

    let resolver = Resolver::scope(scope).with_variable_failover(decl);
    let mut ctx = Context::new(world, dgn, resolver);
    ctx.resolve_exprs(&mut params);

    world.decl_mut(decl).symbol.parameters = params;
}

/// Resolve one declaration's own content.
pub fn resolve_decl(world: &mut ModuleSet, dgn: &mut Diagnostics, decl: DeclId) {
    match world.decl(decl).kind() {
        DeclKind::DataSum => {
            if let Some(definition) = world.decl(decl).definition() {
                resolve_scope(world, dgn, definition);
            }
        }
        DeclKind::DataSumCtor => {
            let fields = match &world.decl(decl).body {
                DeclBody::DataSumCtor { fields, .. } => fields.clone(),
                _ => unreachable!(),
            };
            for field in fields {
                resolve_decl(world, dgn, field);
            }
        }
        DeclKind::DataProduct => {
            if let Some(definition) = world.decl(decl).definition() {
                resolve_scope(world, dgn, definition);
                let fields: Vec<DeclId> = world
                    .scope(definition)
                    .declarations
                    .iter()
                    .copied()
                    .filter(|d| world.decl(*d).kind() == DeclKind::Variable)
                    .collect();
                world.scope_mut(definition).kind = ScopeKind::DataProduct { fields };
            }
        }
        DeclKind::Symbol => {
            let scope = world.decl(decl).scope;
            let expr = match &mut world.decl_mut(decl).body {
                DeclBody::Symbol { expr } => expr.take(),
                _ => unreachable!(),
            };
            if let Some(mut expr) = expr {
                // The alias's own symbol variables are visible in its body.
                let resolver = Resolver::scope(scope).with_supplementary(decl);
                Context::new(world, dgn, resolver).resolve_expr(&mut expr);
                match &mut world.decl_mut(decl).body {
                    DeclBody::Symbol { expr: slot } => *slot = Some(expr),
                    _ => unreachable!(),
                }
            }
        }
        DeclKind::Variable => {
            let scope = world.decl(decl).scope;
            let (constraint, init) = match &mut world.decl_mut(decl).body {
                DeclBody::Variable { constraint, init } => (constraint.take(), init.take()),
                _ => unreachable!(),
            };
            let mut constraint = constraint;
            let mut init = init;
            {
                let mut ctx = Context::new(world, dgn, Resolver::scope(scope));
                if let Some(c) = &mut constraint {
                    ctx.resolve_expr(c);
                }
                if let Some(i) = &mut init {
                    ctx.resolve_expr(i);
                }
            }
            match &mut world.decl_mut(decl).body {
                DeclBody::Variable {
                    constraint: cslot,
                    init: islot,
                } => {
                    *cslot = constraint;
                    *islot = init;
                }
                _ => unreachable!(),
            }
        }
        DeclKind::Procedure => {
            resolve_prototype(world, dgn, decl);
            if let Some(definition) = world.decl(decl).definition() {
                resolve_scope(world, dgn, definition);

                let mut body = match &mut world.scope_mut(definition).kind {
                    ScopeKind::Procedure { body } => mem::take(body),
                    _ => unreachable!(),
                };
                let mut ctx = Context::new(world, dgn, Resolver::scope(definition));
                ctx.resolve_exprs(&mut body);
                match &mut world.scope_mut(definition).kind {
                    ScopeKind::Procedure { body: slot } => *slot = body,
                    _ => unreachable!(),
                }
            }
        }
        DeclKind::ProcedureParameter => {
            let scope = world.decl(decl).scope;
            let constraint = match &mut world.decl_mut(decl).body {
                DeclBody::ProcedureParameter { constraint, .. } => constraint.take(),
                _ => unreachable!(),
            };
            if let Some(mut constraint) = constraint {
                Context::new(world, dgn, Resolver::scope(scope)).resolve_expr(&mut constraint);
                match &mut world.decl_mut(decl).body {
                    DeclBody::ProcedureParameter { constraint: slot, .. } => {
                        *slot = Some(constraint)
                    }
                    _ => unreachable!(),
                }
            }
        }
        DeclKind::Import | DeclKind::SymbolVariable => {}
    }
}

/// Resolve a procedure's parameter constraints, return type, and result.
///
/// Runs against the definition scope, whose owning declaration exposes the
/// procedure's symbol variables.
pub fn resolve_prototype(world: &mut ModuleSet, dgn: &mut Diagnostics, decl: DeclId) {
    let (parameters, result, definition) = match &world.decl(decl).body {
        DeclBody::Procedure {
            parameters,
            result,
            definition,
            ..
        } => (parameters.clone(), *result, *definition),
        _ => unreachable!("resolve_prototype on non-procedure"),
    };
    let target = definition.unwrap_or(world.decl(decl).scope);

    let return_type = match &mut world.decl_mut(decl).body {
        DeclBody::Procedure { return_type, .. } => return_type.take(),
        _ => unreachable!(),
    };
    if let Some(mut return_type) = return_type {
        Context::new(world, dgn, Resolver::scope(target)).resolve_expr(&mut return_type);
        match &mut world.decl_mut(decl).body {
            DeclBody::Procedure {
                return_type: slot, ..
            } => *slot = Some(return_type),
            _ => unreachable!(),
        }
    }

    for parameter in parameters {
        resolve_decl(world, dgn, parameter);
    }
    if let Some(result) = result {
        resolve_decl(world, dgn, result);
    }
}

/// Bind a prototype clone's symbol variables and re-resolve its
/// parameters.
///
/// `bindings` is keyed by the prototype's variables; clone variables are
/// matched by name. A cardinality or name mismatch is a front-end bug.
///
/// # Panics
/// Panics when the binding set does not cover the clone's variables
/// one-to-one.
pub fn bind_variables(
    world: &mut ModuleSet,
    dgn: &mut Diagnostics,
    clone: DeclId,
    bindings: &BindingSet,
) {
    let variable_count = world.decl(clone).symbol.variables.len();
    assert!(
        bindings.len() == variable_count,
        "template parameter binding mismatch: {} bindings for {} variables",
        bindings.len(),
        variable_count
    );

    for (variable, expr) in bindings {
        let name = world.decl(*variable).name().to_string();
        let target = world
            .find_symbol_variable(clone, &name)
            .unwrap_or_else(|| panic!("template parameter binding mismatch: no variable '{}'", name));
        match &mut world.decl_mut(target).body {
            DeclBody::SymbolVariable { bound, .. } => *bound = Some(expr.clone()),
            _ => unreachable!(),
        }
    }

    let scope = world.decl(clone).scope;
    let mut params = mem::take(&mut world.decl_mut(clone).symbol.parameters);
    Context::new(world, dgn, Resolver::scope(scope)).resolve_exprs(&mut params);
    world.decl_mut(clone).symbol.parameters = params;
}
