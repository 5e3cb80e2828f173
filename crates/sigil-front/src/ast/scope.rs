//! Scopes and symbol sets.
//!
//! A scope owns its declarations (by id) and, per declared name, a
//! [`SymbolSet`] holding that name's prototypes. Procedures additionally
//! register in a per-scope overload table keyed the same way. Both tables
//! keep insertion order so diagnostics and matching are deterministic.

use crate::ast::expr::Expr;
use crate::ast::ids::{DeclId, ModuleId, ScopeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered set of variable bindings, sorted by symbol-variable id.
///
/// Kept as a sorted vec rather than a map so binding sets compare
/// element-wise and serialize cleanly.
pub type BindingSet = Vec<(DeclId, Expr)>;

/// Insert a binding, keeping order; the first binding of a variable wins.
pub fn bind(set: &mut BindingSet, variable: DeclId, expr: Expr) {
    if let Err(at) = set.binary_search_by_key(&variable, |entry| entry.0) {
        set.insert(at, (variable, expr));
    }
}

/// One cached instantiation of a prototype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instantiation {
    /// The bindings this instance was created with, keyed by the
    /// prototype's symbol variables
    pub bindings: BindingSet,
    /// The instantiated declaration
    pub declaration: DeclId,
}

/// A prototype entry in a symbol set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolTemplate {
    /// The parameter pattern this prototype was declared with
    pub params: Vec<Expr>,
    /// The prototype declaration
    pub declaration: DeclId,
    /// Instantiations produced from this prototype, in creation order
    pub instances: Vec<Instantiation>,
}

/// All prototypes sharing one name within a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSet {
    /// The scope owning this set
    pub scope: ScopeId,
    pub name: String,
    pub templates: Vec<SymbolTemplate>,
}

impl SymbolSet {
    pub fn new(scope: ScopeId, name: impl Into<String>) -> Self {
        Self {
            scope,
            name: name.into(),
            templates: Vec::new(),
        }
    }

    /// Register a prototype.
    pub fn append(&mut self, params: Vec<Expr>, declaration: DeclId) {
        self.templates.push(SymbolTemplate {
            params,
            declaration,
            instances: Vec::new(),
        });
    }

    /// Read-only view of the prototypes, for diagnostics.
    pub fn prototypes(&self) -> &[SymbolTemplate] {
        &self.templates
    }

    /// First prototype whose parameter list is equivalent to `params`.
    pub fn find_equivalent(
        &self,
        world: &crate::ast::ModuleSet,
        params: &[Expr],
    ) -> Option<DeclId> {
        self.templates
            .iter()
            .find(|t| {
                crate::resolve::matching::match_equivalent_lists(world, &t.params, params)
            })
            .map(|t| t.declaration)
    }

    /// Whether a declaration is already registered as a prototype.
    pub fn contains(&self, declaration: DeclId) -> bool {
        self.templates.iter().any(|t| t.declaration == declaration)
    }
}

/// Scope-kind specific state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScopeKind {
    /// A module's root scope
    Module,
    /// Definition scope of a data sum
    DataSum,
    /// Definition scope of a data product; caches the field declarations
    DataProduct { fields: Vec<DeclId> },
    /// Definition scope of a procedure; owns the body expressions
    Procedure { body: Vec<Expr> },
}

/// A declaration scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    /// Module this scope belongs to
    pub module: ModuleId,
    /// Lexical parent, if any
    pub parent: Option<ScopeId>,
    /// Declaration owning this scope (its definition), if any
    pub declaration: Option<DeclId>,
    /// Declarations in source order; instantiations append here
    pub declarations: Vec<DeclId>,
    /// Per-name prototype sets
    pub symbols: IndexMap<String, SymbolSet>,
    /// Per-name procedure overload sets
    pub procedure_overloads: IndexMap<String, SymbolSet>,
    /// Import declarations by module name
    pub imports: IndexMap<String, DeclId>,
    pub kind: ScopeKind,
}

impl Scope {
    pub fn new(module: ModuleId, parent: Option<ScopeId>, kind: ScopeKind) -> Self {
        Self {
            module,
            parent,
            declaration: None,
            declarations: Vec::new(),
            symbols: IndexMap::new(),
            procedure_overloads: IndexMap::new(),
            imports: IndexMap::new(),
            kind,
        }
    }

    /// The symbol set for `name`, if declarations created one.
    pub fn symbol_set(&self, name: &str) -> Option<&SymbolSet> {
        self.symbols.get(name)
    }

    /// The overload set for `name`, if procedures created one.
    pub fn overload_set(&self, name: &str) -> Option<&SymbolSet> {
        self.procedure_overloads.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Token;

    #[test]
    fn binding_set_orders_and_deduplicates() {
        let mut set = BindingSet::new();
        bind(&mut set, DeclId::new(5), Expr::primary(Token::synthetic("b")));
        bind(&mut set, DeclId::new(2), Expr::primary(Token::synthetic("a")));
        bind(&mut set, DeclId::new(5), Expr::primary(Token::synthetic("c")));

        assert_eq!(set.len(), 2);
        assert_eq!(set[0].0, DeclId::new(2));
        assert_eq!(set[1].0, DeclId::new(5));
        // first binding of a variable wins
        assert_eq!(set[1].1.to_string(), "b");
    }

    #[test]
    fn symbol_set_append_and_contains() {
        let mut set = SymbolSet::new(ScopeId::new(0), "f");
        assert!(!set.contains(DeclId::new(1)));
        set.append(vec![], DeclId::new(1));
        assert!(set.contains(DeclId::new(1)));
        assert_eq!(set.prototypes().len(), 1);
    }
}
