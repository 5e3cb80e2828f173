//! Modules and the module set.
//!
//! [`ModuleSet`] owns every declaration, scope, and module of a
//! compilation in three arenas. All cross-references in the AST are ids
//! into these arenas, so cloning a subtree is: allocate clones, collect an
//! old-id → new-id map, remap.
//!
//! The set always contains a distinguished `axioms` module with the
//! built-in declarations the resolver binds literals to (`integer`,
//! `empty`). Every other module implicitly imports it.

use crate::ast::decl::{DeclBody, Declaration};
use crate::ast::ids::{DeclId, ModuleId, ScopeId};
use crate::ast::scope::{Scope, ScopeKind, SymbolSet};
use crate::ast::symbol::Symbol;
use crate::error::Label;
use crate::lexer::{Token, TokenKind};
use serde::{Deserialize, Serialize};

/// A single module: one root scope plus import and instantiation records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub root: ScopeId,
    /// Imported modules, implicit axioms import included
    pub imports: Vec<ModuleId>,
    /// Every template instance created while resolving this module
    pub template_instantiations: Vec<DeclId>,
}

/// Owner of all modules, declarations, and scopes of a compilation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModuleSet {
    pub modules: Vec<Module>,
    pub decls: Vec<Declaration>,
    pub scopes: Vec<Scope>,
    axioms: ModuleId,
    integer_type: DeclId,
    empty_type: DeclId,
}

impl ModuleSet {
    /// Create a module set containing only the axioms module.
    pub fn new() -> Self {
        let mut set = Self {
            modules: Vec::new(),
            decls: Vec::new(),
            scopes: Vec::new(),
            axioms: ModuleId::new(0),
            integer_type: DeclId::new(0),
            empty_type: DeclId::new(0),
        };

        let axioms = set.alloc_module("axioms");
        set.axioms = axioms;
        set.integer_type = set.axiom_type(axioms, "integer");
        set.empty_type = set.axiom_type(axioms, "empty");
        set
    }

    fn axiom_type(&mut self, module: ModuleId, name: &str) -> DeclId {
        let root = self.modules[module.index()].root;
        let decl = self.alloc_decl(Declaration::new(
            Symbol::new(Token::synthetic(name)),
            root,
            DeclBody::DataSum { definition: None },
        ));
        self.scope_mut(root).declarations.push(decl);
        let set = self
            .scope_mut(root)
            .symbols
            .entry(name.to_string())
            .or_insert_with(|| SymbolSet::new(root, name));
        set.append(Vec::new(), decl);
        decl
    }

    fn alloc_module(&mut self, name: &str) -> ModuleId {
        let id = ModuleId::new(self.modules.len());
        let root = self.alloc_scope(Scope::new(id, None, ScopeKind::Module));
        self.modules.push(Module {
            name: name.to_string(),
            root,
            imports: Vec::new(),
            template_instantiations: Vec::new(),
        });
        id
    }

    /// Create a user module. It implicitly imports the axioms module.
    pub fn create_module(&mut self, name: &str) -> ModuleId {
        let id = self.alloc_module(name);
        let axioms = self.axioms;
        self.modules[id.index()].imports.push(axioms);
        id
    }

    pub fn find_module(&self, name: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .position(|m| m.name == name)
            .map(ModuleId::new)
    }

    pub fn axioms(&self) -> ModuleId {
        self.axioms
    }

    /// The axiom declaration integer literals bind to.
    pub fn integer_type(&self) -> DeclId {
        self.integer_type
    }

    /// The axiom declaration empty open tuples rewrite to.
    pub fn empty_type(&self) -> DeclId {
        self.empty_type
    }

    // --- arena access ---

    pub fn alloc_decl(&mut self, decl: Declaration) -> DeclId {
        let id = DeclId::new(self.decls.len());
        self.decls.push(decl);
        id
    }

    pub fn alloc_scope(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId::new(self.scopes.len());
        self.scopes.push(scope);
        id
    }

    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.index()]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Declaration {
        &mut self.decls[id.index()]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.index()]
    }

    /// Module ids in creation order.
    pub fn module_ids(&self) -> impl Iterator<Item = ModuleId> {
        (0..self.modules.len()).map(ModuleId::new)
    }

    // --- structural helpers ---

    /// Append a declaration to a scope's declaration list.
    pub fn append_declaration(&mut self, scope: ScopeId, decl: DeclId) {
        self.decl_mut(decl).scope = scope;
        self.scope_mut(scope).declarations.push(decl);
    }

    /// Find a declaration by plain name within one scope.
    ///
    /// Procedure scopes search the owning procedure's parameters before the
    /// scope's own declarations.
    pub fn scope_find(&self, scope: ScopeId, name: &str) -> Option<DeclId> {
        let s = self.scope(scope);
        if let Some(owner) = s.declaration {
            if let DeclBody::Procedure { parameters, .. } = &self.decl(owner).body {
                for p in parameters {
                    if self.decl(*p).name() == name {
                        return Some(*p);
                    }
                }
            }
        }
        s.declarations
            .iter()
            .copied()
            .find(|d| self.decl(*d).name() == name)
    }

    /// Find a symbol variable of `decl`'s symbol by name.
    pub fn find_symbol_variable(&self, decl: DeclId, name: &str) -> Option<DeclId> {
        self.decl(decl)
            .symbol
            .variables
            .iter()
            .copied()
            .find(|v| self.decl(*v).name() == name)
    }

    /// Create (or reuse) a symbol variable named after `token` on `decl`'s
    /// symbol.
    pub fn create_symbol_variable(&mut self, decl: DeclId, token: &Token) -> DeclId {
        if let Some(existing) = self.find_symbol_variable(decl, &token.lexeme) {
            return existing;
        }
        let scope = self.decl(decl).scope;
        let identifier = Token::new(TokenKind::Identifier, &*token.lexeme, token.span);
        let variable = self.alloc_decl(Declaration::new(
            Symbol::new(identifier),
            scope,
            DeclBody::SymbolVariable {
                parent: decl,
                bound: None,
            },
        ));
        self.decl_mut(decl).symbol.variables.push(variable);
        variable
    }

    /// The expression a symbol variable is bound to, if any.
    pub fn symbol_variable_binding(&self, variable: DeclId) -> Option<&crate::ast::Expr> {
        match &self.decl(variable).body {
            DeclBody::SymbolVariable { bound, .. } => bound.as_ref(),
            _ => None,
        }
    }

    /// Whether `decl` was produced by template instantiation.
    pub fn is_template_instance(&self, module: ModuleId, decl: DeclId) -> bool {
        self.module(module).template_instantiations.contains(&decl)
    }

    /// A `see`-style diagnostic label pointing at a declaration.
    pub fn see_label(&self, decl: DeclId) -> Label {
        let d = self.decl(decl);
        Label {
            span: d.identifier().span,
            message: format!("see {} '{}'", d.kind(), d.symbol),
        }
    }
}

impl Default for ModuleSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_set_has_axioms() {
        let set = ModuleSet::new();
        assert_eq!(set.module(set.axioms()).name, "axioms");
        assert_eq!(set.decl(set.integer_type()).name(), "integer");
        assert_eq!(set.decl(set.empty_type()).name(), "empty");

        let root = set.module(set.axioms()).root;
        assert!(set.scope(root).symbol_set("integer").is_some());
    }

    #[test]
    fn modules_implicitly_import_axioms() {
        let mut set = ModuleSet::new();
        let m = set.create_module("main");
        assert_eq!(set.module(m).imports, vec![set.axioms()]);
        assert_eq!(set.find_module("main"), Some(m));
        assert_eq!(set.find_module("missing"), None);
    }

    #[test]
    fn symbol_variables_are_created_once_per_name() {
        let mut set = ModuleSet::new();
        let m = set.create_module("main");
        let root = set.module(m).root;
        let owner = set.alloc_decl(Declaration::new(
            Symbol::new(Token::synthetic("id")),
            root,
            DeclBody::Symbol { expr: None },
        ));

        let t1 = set.create_symbol_variable(owner, &Token::synthetic("T"));
        let t2 = set.create_symbol_variable(owner, &Token::synthetic("T"));
        let u = set.create_symbol_variable(owner, &Token::synthetic("U"));

        assert_eq!(t1, t2);
        assert_ne!(t1, u);
        assert_eq!(set.decl(owner).symbol.variables.len(), 2);
        assert_eq!(set.find_symbol_variable(owner, "U"), Some(u));
    }

    #[test]
    fn scope_find_prefers_procedure_parameters() {
        let mut set = ModuleSet::new();
        let m = set.create_module("main");
        let root = set.module(m).root;

        let proc_decl = set.alloc_decl(Declaration::new(
            Symbol::new(Token::synthetic("f")),
            root,
            DeclBody::Procedure {
                parameters: vec![],
                return_type: None,
                result: None,
                definition: None,
            },
        ));
        let body_scope = set.alloc_scope(Scope::new(m, Some(root), ScopeKind::Procedure {
            body: vec![],
        }));
        set.scope_mut(body_scope).declaration = Some(proc_decl);

        let param = set.alloc_decl(Declaration::new(
            Symbol::new(Token::synthetic("x")),
            body_scope,
            DeclBody::ProcedureParameter {
                parent: proc_decl,
                constraint: None,
            },
        ));
        match &mut set.decl_mut(proc_decl).body {
            DeclBody::Procedure { parameters, .. } => parameters.push(param),
            _ => unreachable!(),
        }

        assert_eq!(set.scope_find(body_scope, "x"), Some(param));
        assert_eq!(set.scope_find(body_scope, "y"), None);
    }
}
