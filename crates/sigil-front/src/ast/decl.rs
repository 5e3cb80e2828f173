//! Declarations.
//!
//! The original design used a class hierarchy; here a declaration is a
//! shared header (symbol, enclosing scope, codegen slot) plus a tagged
//! [`DeclBody`]. The enclosing scope owns the declaration; definition
//! scopes and parameter/field/variable sub-declarations are owned through
//! ids into the module-set arenas.

use crate::ast::expr::Expr;
use crate::ast::ids::{DeclId, ScopeId};
use crate::ast::symbol::Symbol;
use crate::codegen::CustomData;
use crate::lexer::Token;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declaration kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclKind {
    DataSum,
    DataSumCtor,
    DataProduct,
    Symbol,
    Procedure,
    Variable,
    ProcedureParameter,
    Import,
    SymbolVariable,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeclKind::DataSum => "data sum",
            DeclKind::DataSumCtor => "data sum ctor",
            DeclKind::DataProduct => "data product",
            DeclKind::Symbol => "symbol",
            DeclKind::Procedure => "procedure",
            DeclKind::Variable => "variable",
            DeclKind::ProcedureParameter => "procedure parameter",
            DeclKind::Import => "import",
            DeclKind::SymbolVariable => "symbol variable",
        };
        f.write_str(name)
    }
}

/// Kind-specific payload of a declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclBody {
    /// `sum name { ctor … }`
    DataSum { definition: Option<ScopeId> },
    /// A constructor inside a data sum
    DataSumCtor { parent: DeclId, fields: Vec<DeclId> },
    /// `record name { field … }`
    DataProduct { definition: Option<ScopeId> },
    /// `name := expr` — a value alias
    Symbol { expr: Option<Expr> },
    /// `name pattern… = body`
    Procedure {
        parameters: Vec<DeclId>,
        return_type: Option<Expr>,
        result: Option<DeclId>,
        definition: Option<ScopeId>,
    },
    /// A plain variable (record fields, constructor fields)
    Variable {
        constraint: Option<Expr>,
        init: Option<Expr>,
    },
    /// One procedure parameter
    ProcedureParameter {
        parent: DeclId,
        constraint: Option<Expr>,
    },
    /// `import name`
    Import,
    /// A named hole in a symbol's parameter list
    SymbolVariable {
        parent: DeclId,
        bound: Option<Expr>,
    },
}

/// A declaration: shared header plus kind-specific body.
#[derive(Debug, Serialize, Deserialize)]
pub struct Declaration {
    pub symbol: Symbol,
    /// The scope this declaration lives in
    pub scope: ScopeId,
    pub body: DeclBody,
    /// Opaque back-end slot; never touched by the front-end
    #[serde(skip)]
    pub codegen: Option<CustomData>,
}

impl Clone for Declaration {
    fn clone(&self) -> Self {
        // Codegen data belongs to the back-end and does not survive cloning.
        Self {
            symbol: self.symbol.clone(),
            scope: self.scope,
            body: self.body.clone(),
            codegen: None,
        }
    }
}

impl Declaration {
    pub fn new(symbol: Symbol, scope: ScopeId, body: DeclBody) -> Self {
        Self {
            symbol,
            scope,
            body,
            codegen: None,
        }
    }

    pub fn kind(&self) -> DeclKind {
        match &self.body {
            DeclBody::DataSum { .. } => DeclKind::DataSum,
            DeclBody::DataSumCtor { .. } => DeclKind::DataSumCtor,
            DeclBody::DataProduct { .. } => DeclKind::DataProduct,
            DeclBody::Symbol { .. } => DeclKind::Symbol,
            DeclBody::Procedure { .. } => DeclKind::Procedure,
            DeclBody::Variable { .. } => DeclKind::Variable,
            DeclBody::ProcedureParameter { .. } => DeclKind::ProcedureParameter,
            DeclBody::Import => DeclKind::Import,
            DeclBody::SymbolVariable { .. } => DeclKind::SymbolVariable,
        }
    }

    pub fn identifier(&self) -> &Token {
        &self.symbol.identifier
    }

    pub fn name(&self) -> &str {
        self.symbol.name()
    }

    pub fn is_procedure(&self) -> bool {
        self.kind() == DeclKind::Procedure
    }

    /// Definition scope, for declaration kinds that own one.
    pub fn definition(&self) -> Option<ScopeId> {
        match &self.body {
            DeclBody::DataSum { definition }
            | DeclBody::DataProduct { definition }
            | DeclBody::Procedure { definition, .. } => *definition,
            _ => None,
        }
    }

    pub fn codegen_data(&self) -> Option<&CustomData> {
        self.codegen.as_ref()
    }

    pub fn set_codegen_data(&mut self, data: CustomData) {
        self.codegen = Some(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(body: DeclBody) -> Declaration {
        Declaration::new(Symbol::new(Token::synthetic("d")), ScopeId::new(0), body)
    }

    #[test]
    fn kind_follows_body() {
        assert_eq!(decl(DeclBody::Import).kind(), DeclKind::Import);
        assert_eq!(
            decl(DeclBody::Symbol { expr: None }).kind(),
            DeclKind::Symbol
        );
        assert!(decl(DeclBody::Procedure {
            parameters: vec![],
            return_type: None,
            result: None,
            definition: None,
        })
        .is_procedure());
    }

    #[test]
    fn clone_drops_codegen_data() {
        let mut d = decl(DeclBody::Import);
        d.set_codegen_data(crate::codegen::CustomData::new(7u8));
        assert!(d.codegen_data().is_some());
        assert!(d.clone().codegen_data().is_none());
    }

    #[test]
    fn definition_only_for_defining_kinds() {
        let sum = decl(DeclBody::DataSum {
            definition: Some(ScopeId::new(4)),
        });
        assert_eq!(sum.definition(), Some(ScopeId::new(4)));
        assert_eq!(decl(DeclBody::Import).definition(), None);
    }
}
