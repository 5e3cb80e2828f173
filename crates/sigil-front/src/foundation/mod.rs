//! Shared foundation types used across the front-end.

pub mod span;

pub use span::{SourceFile, SourceMap, Span};
