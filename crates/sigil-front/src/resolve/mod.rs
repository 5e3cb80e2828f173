//! Name resolution, overload resolution, and template instantiation.
//!
//! The pipeline transforms a freshly parsed [`ModuleSet`] into a fully
//! resolved one in which every identifier-bearing expression refers to a
//! concrete declaration:
//!
//! ```text
//! Lex → Parse → Import Resolution → Symbol Resolution
//!                    ^^^^^^^            ^^^^^^^
//!                 resolve::scopes   resolve::scopes + context
//! ```
//!
//! - [`matching`] — the equivalence / pattern / value relations
//! - [`resolver`] — lookup policies and the hierarchical scope walk
//! - [`context`] — the expression driver with the rewrite channel
//! - [`scopes`] — scope and declaration resolution passes
//! - [`instantiate`] — prototype cloning and the instance cache
//!
//! Resolution is single-threaded and never aborts on user errors: every
//! diagnostic lands in the sink and the traversal continues, so one run
//! reports as many errors as possible.

pub mod context;
pub mod instantiate;
pub mod matching;
pub mod resolver;
pub mod scopes;

pub use context::{enforce_resolution, Context};
pub use instantiate::{clone_declaration, instantiate, TemplateInstance};
pub use matching::{
    bindings_equivalent, match_equivalent, match_equivalent_lists, match_pattern,
    match_pattern_lists, resolve_indirections, symbol_is_concrete, ValueMatcher,
};
pub use resolver::{find_value_plan, in_scope, lookup, LookupHit, Resolver, SymSetRef, ValuePlan};
pub use scopes::{
    bind_variables, resolve_decl, resolve_imports, resolve_module_set, resolve_prototype,
    resolve_scope, resolve_symbol_of,
};

use crate::ast::ModuleSet;
use crate::error::Diagnostics;

/// Run the full resolution pipeline over a module set.
pub fn resolve(world: &mut ModuleSet, dgn: &mut Diagnostics) {
    resolve_module_set(world, dgn);
}
