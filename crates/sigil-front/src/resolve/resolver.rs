//! Lookup policies.
//!
//! A [`Resolver`] says where identifiers resolve: a scope to start from,
//! optional supplementary symbols whose variables are visible, and an
//! optional failover target on whose symbol unknown names become fresh
//! symbol variables (used while resolving symbol parameters, so stray
//! identifiers turn into free-variable holes).
//!
//! Hierarchical lookup order: the scope itself (procedure parameters
//! first), the owning declaration's symbol variables, supplementary
//! symbols, then each parent the same way, and finally the root scopes of
//! the module's imports.

use crate::ast::scope::BindingSet;
use crate::ast::{DeclBody, DeclId, Expr, ModuleSet, ScopeId};
use crate::resolve::matching::{symbol_is_concrete, ValueMatcher};

/// Where identifiers resolve.
#[derive(Debug, Clone)]
pub struct Resolver {
    /// Scope lookups start from
    pub scope: ScopeId,
    /// Extra declarations whose symbol variables are visible by name
    pub supplementary: Vec<DeclId>,
    /// Create missing names as symbol variables on this declaration
    pub failover: Option<DeclId>,
}

impl Resolver {
    /// Ordinary hierarchical resolver.
    pub fn scope(scope: ScopeId) -> Self {
        Self {
            scope,
            supplementary: Vec::new(),
            failover: None,
        }
    }

    /// Make `decl`'s symbol variables visible by name.
    pub fn with_supplementary(mut self, decl: DeclId) -> Self {
        self.supplementary.push(decl);
        self
    }

    /// On lookup miss, create a symbol variable on `decl`'s symbol.
    pub fn with_variable_failover(mut self, decl: DeclId) -> Self {
        self.failover = Some(decl);
        self
    }

    /// The module lookups run against.
    pub fn module(&self, world: &ModuleSet) -> crate::ast::ModuleId {
        world.scope(self.scope).module
    }
}

/// Locates a symbol set inside the module set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymSetRef {
    pub scope: ScopeId,
    pub name: String,
    /// Whether this names an entry of the procedure overload table
    pub overloads: bool,
}

/// Result of a value or procedure lookup.
#[derive(Debug, Default)]
pub struct LookupHit {
    pub decl: Option<DeclId>,
    /// The first symbol set encountered for the name, hit or miss;
    /// diagnostics list its prototypes as candidates.
    pub set: Option<SymSetRef>,
}

impl LookupHit {
    pub fn is_hit(&self) -> bool {
        self.decl.is_some()
    }
}

/// Name-only lookup within the resolver's own scope.
pub fn in_scope(world: &ModuleSet, resolver: &Resolver, name: &str) -> Option<DeclId> {
    if let Some(decl) = world.scope_find(resolver.scope, name) {
        return Some(decl);
    }
    if let Some(owner) = world.scope(resolver.scope).declaration {
        if let Some(variable) = world.find_symbol_variable(owner, name) {
            return Some(variable);
        }
    }
    for extra in &resolver.supplementary {
        if let Some(variable) = world.find_symbol_variable(*extra, name) {
            return Some(variable);
        }
    }
    None
}

/// Full hierarchical name-only lookup.
pub fn lookup(world: &ModuleSet, resolver: &Resolver, name: &str) -> Option<DeclId> {
    if let Some(decl) = in_scope(world, resolver, name) {
        return Some(decl);
    }

    let mut scope = world.scope(resolver.scope).parent;
    while let Some(current) = scope {
        if let Some(decl) = world.scope_find(current, name) {
            return Some(decl);
        }
        if let Some(owner) = world.scope(current).declaration {
            if let Some(variable) = world.find_symbol_variable(owner, name) {
                return Some(variable);
            }
        }
        scope = world.scope(current).parent;
    }

    let module = world.scope(resolver.scope).module;
    for import in &world.module(module).imports {
        let root = world.module(*import).root;
        if let Some(decl) = world.scope_find(root, name) {
            return Some(decl);
        }
    }

    None
}

/// How a value lookup should proceed.
#[derive(Debug)]
pub enum ValuePlan {
    /// A declaration matched outright
    Hit {
        decl: DeclId,
        set: Option<SymSetRef>,
    },
    /// A non-concrete prototype matched; instantiate it with the bindings
    Instantiate {
        set: SymSetRef,
        proto_index: usize,
        bindings: BindingSet,
    },
    /// Nothing matched
    Miss { set: Option<SymSetRef> },
}

/// Scan one scope's set for a value match.
fn scope_value_plan(
    world: &ModuleSet,
    scope: ScopeId,
    name: &str,
    params: &[Expr],
    overloads: bool,
    first_set: &mut Option<SymSetRef>,
) -> Option<ValuePlan> {
    let s = world.scope(scope);
    let set = if overloads {
        s.overload_set(name)
    } else {
        s.symbol_set(name)
    }?;

    let set_ref = SymSetRef {
        scope,
        name: name.to_string(),
        overloads,
    };
    if first_set.is_none() {
        *first_set = Some(set_ref.clone());
    }

    for (proto_index, template) in set.templates.iter().enumerate() {
        let mut matcher = ValueMatcher::default();
        if !matcher.match_value_lists(world, &template.params, params) {
            continue;
        }
        if symbol_is_concrete(world, template.declaration) {
            return Some(ValuePlan::Hit {
                decl: template.declaration,
                set: Some(set_ref),
            });
        }
        // Bindings flowing right-to-left mean the query itself still has
        // holes; hand back the prototype unchanged.
        if !matcher.right.is_empty() {
            return Some(ValuePlan::Hit {
                decl: template.declaration,
                set: Some(set_ref),
            });
        }
        return Some(ValuePlan::Instantiate {
            set: set_ref,
            proto_index,
            bindings: matcher.left,
        });
    }

    None
}

/// Procedure parameter of the scope's owning declaration, by name.
fn procedure_parameter(world: &ModuleSet, scope: ScopeId, name: &str) -> Option<DeclId> {
    let owner = world.scope(scope).declaration?;
    match &world.decl(owner).body {
        DeclBody::Procedure { parameters, .. } => parameters
            .iter()
            .copied()
            .find(|p| world.decl(*p).name() == name),
        _ => None,
    }
}

/// Plan a hierarchical value (or procedure-overload) lookup.
///
/// Bare names (`params` empty, symbol table) also see procedure
/// parameters, owning declarations' symbol variables, and the resolver's
/// supplementary symbols; parameterized lookups go through symbol sets
/// only.
pub fn find_value_plan(
    world: &ModuleSet,
    resolver: &Resolver,
    name: &str,
    params: &[Expr],
    overloads: bool,
) -> ValuePlan {
    let mut first_set = None;
    let bare = !overloads && params.is_empty();

    let mut scope = Some(resolver.scope);
    while let Some(current) = scope {
        if bare {
            if let Some(param) = procedure_parameter(world, current, name) {
                return ValuePlan::Hit {
                    decl: param,
                    set: None,
                };
            }
        }
        if let Some(plan) =
            scope_value_plan(world, current, name, params, overloads, &mut first_set)
        {
            return plan;
        }
        if bare {
            if let Some(owner) = world.scope(current).declaration {
                if let Some(variable) = world.find_symbol_variable(owner, name) {
                    return ValuePlan::Hit {
                        decl: variable,
                        set: None,
                    };
                }
            }
            if current == resolver.scope {
                for extra in &resolver.supplementary {
                    if let Some(variable) = world.find_symbol_variable(*extra, name) {
                        return ValuePlan::Hit {
                            decl: variable,
                            set: None,
                        };
                    }
                }
            }
        }
        scope = world.scope(current).parent;
    }

    let module = world.scope(resolver.scope).module;
    for import in &world.module(module).imports {
        let root = world.module(*import).root;
        if let Some(plan) =
            scope_value_plan(world, root, name, params, overloads, &mut first_set)
        {
            return plan;
        }
    }

    ValuePlan::Miss { set: first_set }
}
