//! Hand-written recursive descent parser for Sigil.
//!
//! - `stream`: token stream with lookahead and error recovery
//! - `error`: parse error types
//! - `expr`: expression parsing (juxtaposition applies, constraints)
//! - `decl`: declaration parsing, building into the module-set arenas

mod error;
mod stream;

pub use error::{ParseError, ParseErrorKind};
pub use stream::TokenStream;

pub mod decl;
pub mod expr;

pub use decl::{parse_declaration, parse_module};
pub use expr::{parse_apply, parse_expr, parse_primary};
