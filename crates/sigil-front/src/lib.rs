//! # Sigil front-end
//!
//! Compiler front-end for the Sigil language: a small dependently-flavored
//! surface language with symbol declarations parameterized by arbitrary
//! expressions, procedure overloading driven by structural pattern
//! matching on argument expressions, and on-demand template instantiation
//! through symbol-variable binding.
//!
//! ## Pipeline
//!
//! ```text
//! lexer → parser → resolve (imports, symbols, overloads, instantiation)
//! ```
//!
//! The interesting part is `resolve`: a fixpoint driver rewrites
//! expressions in place until every identifier refers to a concrete
//! declaration, instantiating symbol prototypes as their variables are
//! bound by value matching.
//!
//! ## Usage
//!
//! ```
//! use sigil_front::compile::compile_source;
//!
//! let output = compile_source("x := 3");
//! assert!(!output.has_errors());
//! ```

pub mod ast;
pub mod codegen;
pub mod compile;
pub mod error;
pub mod foundation;
pub mod lexer;
pub mod parser;
pub mod resolve;

pub use ast::ModuleSet;
pub use compile::{compile_source, compile_sources, CompileOutput};
pub use error::{Diagnostic, DiagnosticFormatter, Diagnostics, ErrorKind, Severity};
pub use lexer::{Token, TokenKind};

/// Front-end version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
