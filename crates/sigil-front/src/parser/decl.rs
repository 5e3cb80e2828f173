//! Declaration parsing.
//!
//! Declarations are keyword-dispatched and build directly into the module
//! set's arenas:
//!
//! ```text
//! declaration := "import" Identifier
//!              | "sum" head "{" ctors "}"
//!              | "record" head "{" fields "}"
//!              | head ":=" expr                       (symbol alias)
//!              | head pattern… [ "->" expr ] "=" body (procedure)
//! head        := Identifier [ "<" list ">" ]
//! ```
//!
//! A procedure's parameter patterns become its symbol's parameter list
//! (appended after any explicit `<...>` template parameters), so
//! redefinition detection, structural overloading, and template
//! instantiation all work through the same symbol sets.

use crate::ast::{
    DeclBody, DeclId, Declaration, Expr, ExprKind, ModuleId, ModuleSet, Scope, ScopeId,
    ScopeKind, Symbol,
};
use crate::lexer::{Token, TokenKind};
use crate::parser::expr::{parse_expr, parse_primary};
use crate::parser::stream::TokenStream;
use crate::parser::ParseError;

/// Parse a whole module's declarations into its root scope.
///
/// Recovers at declaration boundaries, returning every error found.
pub fn parse_module(
    world: &mut ModuleSet,
    module: ModuleId,
    tokens: &[Token],
    file_id: u16,
) -> Vec<ParseError> {
    let root = world.module(module).root;
    let mut stream = TokenStream::new(tokens, file_id);
    let mut errors = Vec::new();

    loop {
        stream.skip_separators();
        if stream.at_end() {
            break;
        }
        if let Err(error) = parse_declaration(world, root, &mut stream) {
            errors.push(error);
            stream.synchronize();
        }
    }

    errors
}

/// Parse one declaration into `scope`.
pub fn parse_declaration(
    world: &mut ModuleSet,
    scope: ScopeId,
    stream: &mut TokenStream,
) -> Result<DeclId, ParseError> {
    match stream.peek_kind() {
        Some(TokenKind::Import) => parse_import(world, scope, stream),
        Some(TokenKind::Sum) => parse_data_sum(world, scope, stream),
        Some(TokenKind::Record) => parse_data_product(world, scope, stream),
        Some(TokenKind::Identifier) => parse_symbol_or_procedure(world, scope, stream),
        _ => Err(ParseError::unexpected_token(
            stream.peek(),
            "where a declaration was expected",
            stream.current_span(),
        )),
    }
}

fn parse_import(
    world: &mut ModuleSet,
    scope: ScopeId,
    stream: &mut TokenStream,
) -> Result<DeclId, ParseError> {
    stream.advance();
    let name = stream.expect(TokenKind::Identifier)?;
    let decl = world.alloc_decl(Declaration::new(
        Symbol::new(name.clone()),
        scope,
        DeclBody::Import,
    ));
    world.append_declaration(scope, decl);
    world.scope_mut(scope).imports.insert(name.lexeme, decl);
    Ok(decl)
}

/// `Identifier [ "<" list ">" ]`
fn parse_symbol_head(stream: &mut TokenStream) -> Result<(Token, Vec<Expr>), ParseError> {
    let name = stream.expect(TokenKind::Identifier)?;
    let mut parameters = Vec::new();
    if let Some(next) = stream.peek() {
        let adjacent = next.kind == TokenKind::OpenAngle
            && next.span.file_id == name.span.file_id
            && next.span.start == name.span.end;
        if adjacent {
            stream.advance();
            if !stream.check(TokenKind::CloseAngle) {
                loop {
                    parameters.push(parse_expr(stream)?);
                    if stream.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
            }
            stream.expect(TokenKind::CloseAngle)?;
        }
    }
    Ok((name, parameters))
}

fn parse_data_sum(
    world: &mut ModuleSet,
    scope: ScopeId,
    stream: &mut TokenStream,
) -> Result<DeclId, ParseError> {
    stream.advance();
    let (name, parameters) = parse_symbol_head(stream)?;

    let sum = world.alloc_decl(Declaration::new(
        Symbol::with_parameters(name, parameters),
        scope,
        DeclBody::DataSum { definition: None },
    ));
    let module = world.scope(scope).module;
    let definition = world.alloc_scope(Scope::new(module, Some(scope), ScopeKind::DataSum));
    world.scope_mut(definition).declaration = Some(sum);

    stream.expect(TokenKind::OpenBrace)?;
    stream.skip_separators();
    while !stream.check(TokenKind::CloseBrace) {
        parse_constructor(world, definition, sum, stream)?;
        stream.skip_separators();
    }
    stream.expect(TokenKind::CloseBrace)?;

    match &mut world.decl_mut(sum).body {
        DeclBody::DataSum { definition: slot } => *slot = Some(definition),
        _ => unreachable!(),
    }
    world.append_declaration(scope, sum);
    Ok(sum)
}

/// `head [ "(" field { "," field } ")" ]`, field := `Identifier [":" expr]`
fn parse_constructor(
    world: &mut ModuleSet,
    definition: ScopeId,
    sum: DeclId,
    stream: &mut TokenStream,
) -> Result<DeclId, ParseError> {
    let (name, parameters) = parse_symbol_head(stream)?;
    let ctor = world.alloc_decl(Declaration::new(
        Symbol::with_parameters(name, parameters),
        definition,
        DeclBody::DataSumCtor {
            parent: sum,
            fields: Vec::new(),
        },
    ));

    let mut fields = Vec::new();
    if stream.eat(TokenKind::OpenParen).is_some() {
        loop {
            let field_name = stream.expect(TokenKind::Identifier)?;
            let constraint = if stream.eat(TokenKind::Colon).is_some() {
                Some(parse_expr(stream)?)
            } else {
                None
            };
            fields.push(world.alloc_decl(Declaration::new(
                Symbol::new(field_name),
                definition,
                DeclBody::Variable {
                    constraint,
                    init: None,
                },
            )));
            if stream.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        stream.expect(TokenKind::CloseParen)?;
    }

    match &mut world.decl_mut(ctor).body {
        DeclBody::DataSumCtor { fields: slot, .. } => *slot = fields,
        _ => unreachable!(),
    }
    world.append_declaration(definition, ctor);
    Ok(ctor)
}

fn parse_data_product(
    world: &mut ModuleSet,
    scope: ScopeId,
    stream: &mut TokenStream,
) -> Result<DeclId, ParseError> {
    stream.advance();
    let (name, parameters) = parse_symbol_head(stream)?;

    let product = world.alloc_decl(Declaration::new(
        Symbol::with_parameters(name, parameters),
        scope,
        DeclBody::DataProduct { definition: None },
    ));
    let module = world.scope(scope).module;
    let definition = world.alloc_scope(Scope::new(
        module,
        Some(scope),
        ScopeKind::DataProduct { fields: Vec::new() },
    ));
    world.scope_mut(definition).declaration = Some(product);

    stream.expect(TokenKind::OpenBrace)?;
    stream.skip_separators();
    while !stream.check(TokenKind::CloseBrace) {
        let field_name = stream.expect(TokenKind::Identifier)?;
        stream.expect(TokenKind::Colon)?;
        let constraint = parse_expr(stream)?;
        let field = world.alloc_decl(Declaration::new(
            Symbol::new(field_name),
            definition,
            DeclBody::Variable {
                constraint: Some(constraint),
                init: None,
            },
        ));
        world.append_declaration(definition, field);
        stream.skip_separators();
    }
    stream.expect(TokenKind::CloseBrace)?;

    match &mut world.decl_mut(product).body {
        DeclBody::DataProduct { definition: slot } => *slot = Some(definition),
        _ => unreachable!(),
    }
    world.append_declaration(scope, product);
    Ok(product)
}

/// One parsed procedure parameter: the pattern expression plus, when the
/// pattern names a parameter, the material for its declaration.
struct ParamSpec {
    name: Option<Token>,
    constraint: Option<Expr>,
}

fn parse_symbol_or_procedure(
    world: &mut ModuleSet,
    scope: ScopeId,
    stream: &mut TokenStream,
) -> Result<DeclId, ParseError> {
    let (name, head_parameters) = parse_symbol_head(stream)?;

    if stream.eat(TokenKind::Define).is_some() {
        let expr = parse_expr(stream)?;
        let decl = world.alloc_decl(Declaration::new(
            Symbol::with_parameters(name, head_parameters),
            scope,
            DeclBody::Symbol { expr: Some(expr) },
        ));
        world.append_declaration(scope, decl);
        return Ok(decl);
    }

    // Procedure: patterns up to `->` or `=`.
    let mut patterns = head_parameters;
    let mut specs = Vec::new();
    loop {
        match stream.peek_kind() {
            Some(TokenKind::Arrow) | Some(TokenKind::Equals) => break,
            Some(TokenKind::Identifier) => {
                let id = stream.advance().expect("peeked");
                if stream.eat(TokenKind::Colon).is_some() {
                    let constraint = parse_primary(stream)?;
                    patterns.push(Expr::constraint(
                        Expr::primary(id.clone()),
                        constraint.clone(),
                    ));
                    specs.push(ParamSpec {
                        name: Some(id),
                        constraint: Some(constraint),
                    });
                } else {
                    patterns.push(Expr::primary(id.clone()));
                    specs.push(ParamSpec {
                        name: Some(id),
                        constraint: None,
                    });
                }
            }
            Some(TokenKind::Integer) => {
                let literal = stream.advance().expect("peeked");
                patterns.push(Expr::primary(literal));
                specs.push(ParamSpec {
                    name: None,
                    constraint: None,
                });
            }
            Some(TokenKind::OpenParen) => {
                stream.advance();
                let pattern = parse_expr(stream)?;
                stream.expect(TokenKind::CloseParen)?;
                let spec = param_spec_of(&pattern);
                patterns.push(pattern);
                specs.push(spec);
            }
            _ => {
                return Err(ParseError::unexpected_token(
                    stream.peek(),
                    "where a parameter, '->', or '=' was expected",
                    stream.current_span(),
                ))
            }
        }
    }

    let return_type = if stream.eat(TokenKind::Arrow).is_some() {
        Some(parse_expr(stream)?)
    } else {
        None
    };
    stream.expect(TokenKind::Equals)?;
    let body = parse_procedure_body(stream)?;

    let procedure = world.alloc_decl(Declaration::new(
        Symbol::with_parameters(name, patterns),
        scope,
        DeclBody::Procedure {
            parameters: Vec::new(),
            return_type: return_type.clone(),
            result: None,
            definition: None,
        },
    ));
    let module = world.scope(scope).module;
    let definition = world.alloc_scope(Scope::new(
        module,
        Some(scope),
        ScopeKind::Procedure { body },
    ));
    world.scope_mut(definition).declaration = Some(procedure);

    let mut parameters = Vec::new();
    for spec in specs {
        if let Some(param_name) = spec.name {
            parameters.push(world.alloc_decl(Declaration::new(
                Symbol::new(param_name),
                definition,
                DeclBody::ProcedureParameter {
                    parent: procedure,
                    constraint: spec.constraint,
                },
            )));
        }
    }
    let result = return_type.map(|constraint| {
        world.alloc_decl(Declaration::new(
            Symbol::new(Token::synthetic("result")),
            definition,
            DeclBody::ProcedureParameter {
                parent: procedure,
                constraint: Some(constraint),
            },
        ))
    });

    match &mut world.decl_mut(procedure).body {
        DeclBody::Procedure {
            parameters: pslot,
            result: rslot,
            definition: dslot,
            ..
        } => {
            *pslot = parameters;
            *rslot = result;
            *dslot = Some(definition);
        }
        _ => unreachable!(),
    }
    world.append_declaration(scope, procedure);
    Ok(procedure)
}

/// The parameter name and constraint a parenthesized pattern provides.
fn param_spec_of(pattern: &Expr) -> ParamSpec {
    match &pattern.kind {
        ExprKind::Primary { token } if token.kind == TokenKind::Identifier => ParamSpec {
            name: Some(token.clone()),
            constraint: None,
        },
        ExprKind::Constraint {
            subject,
            constraint,
        } => match &subject.kind {
            ExprKind::Primary { token } if token.kind.is_identifier() => ParamSpec {
                name: Some(token.clone()),
                constraint: Some((**constraint).clone()),
            },
            _ => ParamSpec {
                name: None,
                constraint: None,
            },
        },
        _ => ParamSpec {
            name: None,
            constraint: None,
        },
    }
}

/// `expr` or `"{" { expr sep } "}"`
fn parse_procedure_body(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    if stream.eat(TokenKind::OpenBrace).is_some() {
        let mut body = Vec::new();
        stream.skip_separators();
        while !stream.check(TokenKind::CloseBrace) {
            body.push(parse_expr(stream)?);
            stream.skip_separators();
        }
        stream.expect(TokenKind::CloseBrace)?;
        Ok(body)
    } else {
        Ok(vec![parse_expr(stream)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DeclKind;
    use crate::lexer::lex;

    fn parse_source(source: &str) -> (ModuleSet, ModuleId, Vec<ParseError>) {
        let mut world = ModuleSet::new();
        let module = world.create_module("main");
        let (tokens, lex_errors) = lex(source, 0);
        assert!(lex_errors.is_empty());
        let errors = parse_module(&mut world, module, &tokens, 0);
        (world, module, errors)
    }

    fn root_decls(world: &ModuleSet, module: ModuleId) -> Vec<DeclId> {
        world.scope(world.module(module).root).declarations.clone()
    }

    #[test]
    fn symbol_declaration() {
        let (world, module, errors) = parse_source("x := 3");
        assert!(errors.is_empty());
        let decls = root_decls(&world, module);
        assert_eq!(decls.len(), 1);
        let decl = world.decl(decls[0]);
        assert_eq!(decl.kind(), DeclKind::Symbol);
        assert_eq!(decl.name(), "x");
    }

    #[test]
    fn parameterized_symbol_declaration() {
        let (world, module, errors) = parse_source(r"id<\T, x : \T> := x");
        assert!(errors.is_empty());
        let decls = root_decls(&world, module);
        let decl = world.decl(decls[0]);
        assert_eq!(decl.symbol.parameters.len(), 2);
        assert_eq!(decl.symbol.to_string(), "id<T, x : T>");
    }

    #[test]
    fn procedure_declaration() {
        let (world, module, errors) = parse_source("f x : int = x");
        assert!(errors.is_empty());
        let decls = root_decls(&world, module);
        let decl = world.decl(decls[0]);
        assert_eq!(decl.kind(), DeclKind::Procedure);
        // the parameter pattern doubles as the symbol's parameter list
        assert_eq!(decl.symbol.to_string(), "f<x : int>");

        let DeclBody::Procedure {
            parameters,
            definition,
            ..
        } = &decl.body
        else {
            panic!("expected procedure");
        };
        assert_eq!(parameters.len(), 1);
        assert_eq!(world.decl(parameters[0]).name(), "x");
        let definition = definition.expect("definition scope");
        assert_eq!(world.scope(definition).declaration, Some(decls[0]));
        let ScopeKind::Procedure { body } = &world.scope(definition).kind else {
            panic!("expected procedure scope");
        };
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn procedure_with_return_type_and_block_body() {
        let (world, module, errors) = parse_source("f x -> int = {\n  x\n  3\n}");
        assert!(errors.is_empty());
        let decls = root_decls(&world, module);
        let DeclBody::Procedure {
            return_type,
            result,
            definition,
            ..
        } = &world.decl(decls[0]).body
        else {
            panic!("expected procedure");
        };
        assert!(return_type.is_some());
        assert!(result.is_some());
        let ScopeKind::Procedure { body } = &world.scope(definition.unwrap()).kind else {
            panic!()
        };
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn literal_patterns_have_no_parameter_decl() {
        let (world, module, errors) = parse_source("fib 0 = 0\nfib 1 = 1\nfib n = n");
        assert!(errors.is_empty());
        let decls = root_decls(&world, module);
        assert_eq!(decls.len(), 3);
        let DeclBody::Procedure { parameters, .. } = &world.decl(decls[0]).body else {
            panic!()
        };
        assert!(parameters.is_empty());
        let DeclBody::Procedure { parameters, .. } = &world.decl(decls[2]).body else {
            panic!()
        };
        assert_eq!(parameters.len(), 1);
    }

    #[test]
    fn import_declaration() {
        let (world, module, errors) = parse_source("import prelude");
        assert!(errors.is_empty());
        let root = world.module(module).root;
        assert!(world.scope(root).imports.contains_key("prelude"));
    }

    #[test]
    fn data_sum_with_constructors() {
        let (world, module, errors) =
            parse_source("sum bool {\n  true\n  false\n}");
        assert!(errors.is_empty());
        let decls = root_decls(&world, module);
        let sum = world.decl(decls[0]);
        assert_eq!(sum.kind(), DeclKind::DataSum);
        let definition = sum.definition().expect("definition");
        let ctors = &world.scope(definition).declarations;
        assert_eq!(ctors.len(), 2);
        assert_eq!(world.decl(ctors[0]).kind(), DeclKind::DataSumCtor);
        assert_eq!(world.decl(ctors[0]).name(), "true");
    }

    #[test]
    fn data_sum_constructor_fields() {
        let (world, module, errors) =
            parse_source("sum shape {\n  circle(radius : int)\n  point\n}");
        assert!(errors.is_empty());
        let decls = root_decls(&world, module);
        let definition = world.decl(decls[0]).definition().unwrap();
        let ctor = world.scope(definition).declarations[0];
        let DeclBody::DataSumCtor { fields, .. } = &world.decl(ctor).body else {
            panic!()
        };
        assert_eq!(fields.len(), 1);
        assert_eq!(world.decl(fields[0]).name(), "radius");
    }

    #[test]
    fn data_product_fields_live_in_its_scope() {
        let (world, module, errors) =
            parse_source("record point {\n  x : int\n  y : int\n}");
        assert!(errors.is_empty());
        let decls = root_decls(&world, module);
        let product = world.decl(decls[0]);
        assert_eq!(product.kind(), DeclKind::DataProduct);
        let definition = product.definition().unwrap();
        assert_eq!(world.scope(definition).declarations.len(), 2);
    }

    #[test]
    fn recovery_continues_after_bad_declaration() {
        let (world, module, errors) = parse_source("x := := 3\ny := 4");
        assert_eq!(errors.len(), 1);
        let decls = root_decls(&world, module);
        assert_eq!(decls.len(), 1);
        assert_eq!(world.decl(decls[0]).name(), "y");
    }
}
