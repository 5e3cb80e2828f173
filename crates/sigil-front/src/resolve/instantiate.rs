//! Template instantiation.
//!
//! Instantiating a prototype clones the declaration together with its
//! owned sub-declarations and definition scopes, remaps every id inside
//! the cloned region through a single old-id → new-id map (ids outside
//! the region stay put — they refer to surroundings that remain live),
//! binds the clone's symbol variables, and resolves the clone. Instances
//! are cached per prototype by binding-set equivalence, and the cache
//! entry is registered before the clone's body resolves so self-referential
//! bodies find the instance instead of instantiating forever.

use crate::ast::scope::BindingSet;
use crate::ast::{DeclBody, DeclId, Instantiation, ModuleSet, ScopeId, ScopeKind};
use crate::error::Diagnostics;
use crate::resolve::matching::bindings_equivalent;
use crate::resolve::resolver::SymSetRef;
use crate::resolve::scopes;
use std::collections::HashMap;

/// Result of a value lookup that may have instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateInstance {
    /// The prototype that matched
    pub prototype: DeclId,
    /// The instantiation, absent when the prototype was concrete
    pub instance: Option<DeclId>,
}

#[derive(Debug, Default)]
struct CloneMaps {
    decls: HashMap<DeclId, DeclId>,
    scopes: HashMap<ScopeId, ScopeId>,
}

/// Deep-clone a declaration subtree; returns the clone and the
/// declaration map used for reference remapping.
pub fn clone_declaration(
    world: &mut ModuleSet,
    source: DeclId,
) -> (DeclId, HashMap<DeclId, DeclId>) {
    let mut maps = CloneMaps::default();
    let root = clone_decl_rec(world, source, &mut maps);

    let new_decls: Vec<DeclId> = maps.decls.values().copied().collect();
    let new_scopes: Vec<ScopeId> = maps.scopes.values().copied().collect();
    for decl in new_decls {
        remap_decl(world, decl, &maps);
    }
    for scope in new_scopes {
        remap_scope(world, scope, &maps);
    }

    (root, maps.decls)
}

fn clone_decl_rec(world: &mut ModuleSet, source: DeclId, maps: &mut CloneMaps) -> DeclId {
    let copy = world.decl(source).clone();
    let clone = world.alloc_decl(copy);
    maps.decls.insert(source, clone);

    // Symbol variables are owned by the symbol.
    let variables = world.decl(clone).symbol.variables.clone();
    let cloned_variables: Vec<DeclId> = variables
        .iter()
        .map(|v| clone_decl_rec(world, *v, maps))
        .collect();
    world.decl_mut(clone).symbol.variables = cloned_variables;

    // Owned children of the body.
    let (children, result, definition) = match &world.decl(clone).body {
        DeclBody::DataSum { definition } | DeclBody::DataProduct { definition } => {
            (Vec::new(), None, *definition)
        }
        DeclBody::DataSumCtor { fields, .. } => (fields.clone(), None, None),
        DeclBody::Procedure {
            parameters,
            result,
            definition,
            ..
        } => (parameters.clone(), *result, *definition),
        _ => (Vec::new(), None, None),
    };

    let cloned_children: Vec<DeclId> = children
        .iter()
        .map(|c| clone_decl_rec(world, *c, maps))
        .collect();
    let cloned_result = result.map(|r| clone_decl_rec(world, r, maps));
    let cloned_definition = definition.map(|s| clone_scope_rec(world, s, maps));

    match &mut world.decl_mut(clone).body {
        DeclBody::DataSum { definition } | DeclBody::DataProduct { definition } => {
            *definition = cloned_definition;
        }
        DeclBody::DataSumCtor { fields, .. } => *fields = cloned_children,
        DeclBody::Procedure {
            parameters,
            result,
            definition,
            ..
        } => {
            *parameters = cloned_children;
            *result = cloned_result;
            *definition = cloned_definition;
        }
        _ => {}
    }

    clone
}

fn clone_scope_rec(world: &mut ModuleSet, source: ScopeId, maps: &mut CloneMaps) -> ScopeId {
    let copy = world.scope(source).clone();
    let clone = world.alloc_scope(copy);
    maps.scopes.insert(source, clone);

    let decls = world.scope(clone).declarations.clone();
    let cloned: Vec<DeclId> = decls
        .iter()
        .map(|d| clone_decl_rec(world, *d, maps))
        .collect();
    world.scope_mut(clone).declarations = cloned;

    clone
}

fn map_decl(id: DeclId, maps: &CloneMaps) -> DeclId {
    maps.decls.get(&id).copied().unwrap_or(id)
}

fn map_scope(id: ScopeId, maps: &CloneMaps) -> ScopeId {
    maps.scopes.get(&id).copied().unwrap_or(id)
}

fn remap_decl(world: &mut ModuleSet, decl: DeclId, maps: &CloneMaps) {
    let d = world.decl_mut(decl);
    d.scope = map_scope(d.scope, maps);
    for param in &mut d.symbol.parameters {
        param.remap_decls(&maps.decls);
    }
    match &mut d.body {
        DeclBody::DataSumCtor { parent, .. } => *parent = map_decl(*parent, maps),
        DeclBody::Symbol { expr } => {
            if let Some(expr) = expr {
                expr.remap_decls(&maps.decls);
            }
        }
        DeclBody::Procedure { return_type, .. } => {
            if let Some(return_type) = return_type {
                return_type.remap_decls(&maps.decls);
            }
        }
        DeclBody::Variable { constraint, init } => {
            if let Some(constraint) = constraint {
                constraint.remap_decls(&maps.decls);
            }
            if let Some(init) = init {
                init.remap_decls(&maps.decls);
            }
        }
        DeclBody::ProcedureParameter { parent, constraint } => {
            *parent = map_decl(*parent, maps);
            if let Some(constraint) = constraint {
                constraint.remap_decls(&maps.decls);
            }
        }
        DeclBody::SymbolVariable { parent, bound } => {
            *parent = map_decl(*parent, maps);
            if let Some(bound) = bound {
                bound.remap_decls(&maps.decls);
            }
        }
        DeclBody::DataSum { .. } | DeclBody::DataProduct { .. } | DeclBody::Import => {}
    }
}

fn remap_scope(world: &mut ModuleSet, scope: ScopeId, maps: &CloneMaps) {
    let s = world.scope_mut(scope);
    s.parent = s.parent.map(|p| map_scope(p, maps));
    s.declaration = s.declaration.map(|d| map_decl(d, maps));
    match &mut s.kind {
        ScopeKind::Procedure { body } => {
            for expr in body {
                expr.remap_decls(&maps.decls);
            }
        }
        ScopeKind::DataProduct { fields } => {
            for field in fields {
                *field = map_decl(*field, maps);
            }
        }
        _ => {}
    }
    for set in s
        .symbols
        .values_mut()
        .chain(s.procedure_overloads.values_mut())
    {
        set.scope = map_scope(set.scope, maps);
        for template in &mut set.templates {
            template.declaration = map_decl(template.declaration, maps);
            for param in &mut template.params {
                param.remap_decls(&maps.decls);
            }
            for instance in &mut template.instances {
                instance.declaration = map_decl(instance.declaration, maps);
                for (variable, expr) in &mut instance.bindings {
                    *variable = map_decl(*variable, maps);
                    expr.remap_decls(&maps.decls);
                }
            }
        }
    }
    for import in s.imports.values_mut() {
        *import = map_decl(*import, maps);
    }
}

/// Instantiate a prototype with a binding set, or return the cached
/// instance for equivalent bindings.
pub fn instantiate(
    world: &mut ModuleSet,
    dgn: &mut Diagnostics,
    set_ref: &SymSetRef,
    proto_index: usize,
    bindings: BindingSet,
) -> TemplateInstance {
    let (prototype, cached) = {
        let template = &lookup_set(world, set_ref).templates[proto_index];
        let cached = template
            .instances
            .iter()
            .find(|i| bindings_equivalent(world, &i.bindings, &bindings))
            .map(|i| i.declaration);
        (template.declaration, cached)
    };

    if let Some(instance) = cached {
        return TemplateInstance {
            prototype,
            instance: Some(instance),
        };
    }

    tracing::debug!(symbol = %world.decl(prototype).symbol, "instantiating template");

    let (clone, _map) = clone_declaration(world, prototype);

    // Register before resolving: a self-referential body must find this
    // instance in the cache rather than recurse.
    lookup_set_mut(world, set_ref).templates[proto_index]
        .instances
        .push(Instantiation {
            bindings: bindings.clone(),
            declaration: clone,
        });
    world.append_declaration(set_ref.scope, clone);
    let module = world.scope(set_ref.scope).module;
    world.module_mut(module).template_instantiations.push(clone);

    scopes::bind_variables(world, dgn, clone, &bindings);
    if world.decl(clone).is_procedure() {
        scopes::resolve_prototype(world, dgn, clone);
    }
    scopes::resolve_decl(world, dgn, clone);

    TemplateInstance {
        prototype,
        instance: Some(clone),
    }
}

fn lookup_set<'a>(world: &'a ModuleSet, set_ref: &SymSetRef) -> &'a crate::ast::SymbolSet {
    let scope = world.scope(set_ref.scope);
    let set = if set_ref.overloads {
        scope.overload_set(&set_ref.name)
    } else {
        scope.symbol_set(&set_ref.name)
    };
    set.expect("symbol set vanished between lookup and instantiation")
}

fn lookup_set_mut<'a>(
    world: &'a mut ModuleSet,
    set_ref: &SymSetRef,
) -> &'a mut crate::ast::SymbolSet {
    let scope = world.scope_mut(set_ref.scope);
    let set = if set_ref.overloads {
        scope.procedure_overloads.get_mut(&set_ref.name)
    } else {
        scope.symbols.get_mut(&set_ref.name)
    };
    set.expect("symbol set vanished between lookup and instantiation")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Declaration, Expr, Symbol};
    use crate::lexer::Token;

    /// Clone a symbol alias whose expression references its own variable;
    /// the clone's reference must point at the clone's variable.
    #[test]
    fn clone_remaps_internal_references() {
        let mut world = ModuleSet::new();
        let module = world.create_module("main");
        let root = world.module(module).root;

        let alias = world.alloc_decl(Declaration::new(
            Symbol::new(Token::synthetic("id")),
            root,
            DeclBody::Symbol { expr: None },
        ));
        world.append_declaration(root, alias);
        let t = world.create_symbol_variable(alias, &Token::synthetic("T"));

        let mut body = Expr::primary(Token::synthetic("T"));
        body.decl = Some(t);
        match &mut world.decl_mut(alias).body {
            DeclBody::Symbol { expr } => *expr = Some(body),
            _ => unreachable!(),
        }

        let (clone, map) = clone_declaration(&mut world, alias);
        assert_ne!(clone, alias);
        assert_eq!(map.get(&alias), Some(&clone));

        let clone_t = map[&t];
        assert_ne!(clone_t, t);
        assert_eq!(world.decl(clone).symbol.variables, vec![clone_t]);
        match &world.decl(clone).body {
            DeclBody::Symbol { expr: Some(expr) } => assert_eq!(expr.decl, Some(clone_t)),
            other => panic!("expected cloned alias body, got {:?}", other),
        }

        // references outside the cloned region keep their target
        assert_eq!(world.decl(clone).scope, root);
    }

    /// External references (here: a binding to the axioms' integer type)
    /// survive cloning untouched.
    #[test]
    fn clone_keeps_external_references() {
        let mut world = ModuleSet::new();
        let module = world.create_module("main");
        let root = world.module(module).root;
        let integer = world.integer_type();

        let alias = world.alloc_decl(Declaration::new(
            Symbol::new(Token::synthetic("three")),
            root,
            DeclBody::Symbol { expr: None },
        ));
        world.append_declaration(root, alias);
        let mut body = Expr::primary(Token::synthetic("3"));
        body.decl = Some(integer);
        match &mut world.decl_mut(alias).body {
            DeclBody::Symbol { expr } => *expr = Some(body),
            _ => unreachable!(),
        }

        let (clone, _) = clone_declaration(&mut world, alias);
        match &world.decl(clone).body {
            DeclBody::Symbol { expr: Some(expr) } => assert_eq!(expr.decl, Some(integer)),
            other => panic!("expected cloned alias body, got {:?}", other),
        }
    }

    /// Clone-and-remap prints identical text (clone fidelity).
    #[test]
    fn clone_prints_identically() {
        let mut world = ModuleSet::new();
        let module = world.create_module("main");
        let root = world.module(module).root;

        let alias = world.alloc_decl(Declaration::new(
            Symbol::with_parameters(
                Token::synthetic("pair"),
                vec![
                    Expr::primary(Token::synthetic("T")),
                    Expr::primary(Token::synthetic("U")),
                ],
            ),
            root,
            DeclBody::Symbol { expr: None },
        ));
        world.append_declaration(root, alias);

        let (clone, _) = clone_declaration(&mut world, alias);
        assert_eq!(
            world.decl(alias).symbol.to_string(),
            world.decl(clone).symbol.to_string()
        );
    }
}
