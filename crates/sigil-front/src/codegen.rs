//! Hooks for the code-generation back-end.
//!
//! Every declaration carries an opaque slot the back-end may populate with
//! whatever bookkeeping it needs. The front-end only stores and returns the
//! data; it never inspects it, and the slot is skipped during
//! serialization.

use std::any::Any;
use std::fmt;

/// Opaque per-declaration data owned by the code generator.
pub struct CustomData(Box<dyn Any + Send>);

impl CustomData {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.downcast_mut()
    }
}

impl fmt::Debug for CustomData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomData(..)")
    }
}
