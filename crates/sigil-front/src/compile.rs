//! High-level compile API.
//!
//! Drives the full front-end over a batch of sources: lex and parse each
//! into its own module, then run import and symbol resolution across the
//! whole set. Errors never abort the pipeline; the caller inspects the
//! returned diagnostics.

use crate::ast::ModuleSet;
use crate::error::{Diagnostics, ErrorKind};
use crate::foundation::{SourceMap, Span};
use crate::lexer;
use crate::parser;
use crate::resolve;
use std::path::PathBuf;

/// Everything the front-end produced for a batch of sources.
pub struct CompileOutput {
    pub world: ModuleSet,
    pub sources: SourceMap,
    pub diagnostics: Diagnostics,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.error_count() > 0
    }
}

/// Compile named sources into a resolved module set.
///
/// Each `(name, text)` pair becomes one module. Sources are processed in
/// the given order, so modules should precede their importers when import
/// direction matters for diagnostics.
pub fn compile_sources(sources: &[(&str, &str)]) -> CompileOutput {
    let mut world = ModuleSet::new();
    let mut map = SourceMap::new();
    let mut dgn = Diagnostics::new();

    for (name, text) in sources {
        let file_id = map.add_file(PathBuf::from(format!("{}.sgl", name)), text.to_string());
        tracing::debug!(module = name, "lexing and parsing");

        // Module names key cross-file lookup; a collision (including with
        // the built-in axioms module) means the driver was handed bad
        // input.
        if world.find_module(name).is_some() {
            dgn.error(
                ErrorKind::Internal,
                Span::zero(file_id),
                format!("duplicate module name '{}'", name),
            );
            continue;
        }

        let (tokens, lex_errors) = lexer::lex(text, file_id);
        for span in lex_errors {
            dgn.error(ErrorKind::Syntax, span, "unrecognized input");
        }

        let module = world.create_module(name);
        for error in parser::parse_module(&mut world, module, &tokens, file_id) {
            dgn.error(ErrorKind::Syntax, error.span, error.message);
        }
    }

    resolve::resolve(&mut world, &mut dgn);

    CompileOutput {
        world,
        sources: map,
        diagnostics: dgn,
    }
}

/// Compile a single anonymous module.
pub fn compile_source(text: &str) -> CompileOutput {
    compile_sources(&[("main", text)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_source_produces_no_diagnostics() {
        let output = compile_source("x := 3");
        assert!(!output.has_errors(), "{:?}", output.diagnostics.all());
    }

    #[test]
    fn syntax_errors_are_collected_not_thrown() {
        let output = compile_source("x := := 3");
        assert!(output.has_errors());
        assert_eq!(output.diagnostics.all()[0].kind, ErrorKind::Syntax);
    }

    #[test]
    fn modules_resolve_across_files() {
        let output = compile_sources(&[("lib", "three := 3"), ("main", "import lib\nx := three")]);
        assert!(!output.has_errors(), "{:?}", output.diagnostics.all());
    }

    #[test]
    fn duplicate_module_names_are_rejected() {
        let output = compile_sources(&[("main", "x := 3"), ("main", "y := 4")]);
        assert_eq!(output.diagnostics.all().len(), 1);
        assert_eq!(output.diagnostics.all()[0].kind, ErrorKind::Internal);

        // the first module of the name still resolves
        let module = output.world.find_module("main").unwrap();
        let root = output.world.module(module).root;
        assert!(output.world.scope_find(root, "x").is_some());
        assert!(output.world.scope_find(root, "y").is_none());
    }

    #[test]
    fn the_axioms_module_name_is_reserved() {
        let output = compile_sources(&[("axioms", "x := 3")]);
        assert_eq!(output.diagnostics.all()[0].kind, ErrorKind::Internal);
    }
}
