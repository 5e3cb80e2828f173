//! AST for the Sigil front-end.
//!
//! - [`expr`] — expression IR with in-place rewriting support
//! - [`symbol`] — names with parameter patterns and symbol variables
//! - [`decl`] — declarations (header + tagged body)
//! - [`scope`] — scopes, symbol sets, overload sets
//! - [`module`] — modules and the arena-owning [`ModuleSet`]
//! - [`ids`] — typed arena indices

pub mod decl;
pub mod expr;
pub mod ids;
pub mod module;
pub mod scope;
pub mod symbol;

pub use decl::{DeclBody, DeclKind, Declaration};
pub use expr::{
    bind_free_variables, tuple_close_str, tuple_kind, tuple_open_str, Expr, ExprKind,
    TupleKind,
};
pub use ids::{DeclId, ModuleId, ScopeId};
pub use module::{Module, ModuleSet};
pub use scope::{bind, BindingSet, Instantiation, Scope, ScopeKind, SymbolSet, SymbolTemplate};
pub use symbol::Symbol;
