//! Symbols: a name plus the parameter expressions that distinguish it.
//!
//! Every declaration owns one symbol. A parameterized symbol (one whose
//! parameter list mentions unresolved names) is a prototype: resolution
//! turns each stray name into a symbol-variable declaration owned by the
//! symbol, and template instantiation later fills those holes.

use crate::ast::expr::Expr;
use crate::ast::ids::DeclId;
use crate::lexer::Token;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A declared name with its parameter pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// The name token
    pub identifier: Token,
    /// Ordered parameter expressions
    pub parameters: Vec<Expr>,
    /// Symbol-variable declarations owned by this symbol, in creation order
    pub variables: Vec<DeclId>,
}

impl Symbol {
    pub fn new(identifier: Token) -> Self {
        Self {
            identifier,
            parameters: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn with_parameters(identifier: Token, parameters: Vec<Expr>) -> Self {
        Self {
            identifier,
            parameters,
            variables: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.identifier.lexeme
    }

    /// True when the symbol still has unfilled variable slots.
    ///
    /// Concreteness (all bindings resolving through indirection chains) is
    /// a resolution-level question answered by
    /// [`symbol_is_concrete`](crate::resolve::symbol_is_concrete).
    pub fn has_variables(&self) -> bool {
        !self.variables.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier.lexeme)?;
        if !self.parameters.is_empty() {
            write!(f, "<")?;
            for (i, p) in self.parameters.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", p)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_name_and_parameters() {
        let sym = Symbol::with_parameters(
            Token::synthetic("vec"),
            vec![
                Expr::primary(Token::synthetic("T")),
                Expr::primary(Token::synthetic("n")),
            ],
        );
        assert_eq!(sym.to_string(), "vec<T, n>");
        assert_eq!(Symbol::new(Token::synthetic("x")).to_string(), "x");
    }
}
