//! Typed indices into the [`ModuleSet`](super::ModuleSet) arenas.
//!
//! All cross-references in the AST (declaration references, parent scopes,
//! owning modules, instantiation lists) are ids rather than pointers. An id
//! is only meaningful for the module set that produced it.

use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            pub fn new(index: usize) -> Self {
                Self(index as u32)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(
    /// Index of a declaration.
    DeclId
);
arena_id!(
    /// Index of a scope.
    ScopeId
);
arena_id!(
    /// Index of a module.
    ModuleId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_and_order() {
        let a = DeclId::new(3);
        let b = DeclId::new(7);
        assert_eq!(a.index(), 3);
        assert!(a < b);
        assert_ne!(a, b);
    }
}
