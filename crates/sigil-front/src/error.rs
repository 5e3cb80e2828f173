//! Diagnostics for the Sigil front-end.
//!
//! Resolution never aborts on user errors: diagnostics accumulate in an
//! append-only [`Diagnostics`] sink and the caller decides what to do with
//! them. Each [`Diagnostic`] carries a primary span, optional secondary
//! labels (`see`-references to related declarations), and optional notes.
//! [`DiagnosticFormatter`] renders them with source snippets.

use crate::foundation::{SourceMap, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a front-end diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Lexer or parser error
    Syntax,
    /// Identifier resolution failed and no symbol set exists for the name
    UndeclaredIdentifier,
    /// Symbol-expression resolution produced no hit
    UndeclaredSymbol,
    /// Two prototypes with equivalent parameter lists in one symbol set
    SymbolRedefinition,
    /// Free variable outside a symbol-parameter context
    UnboundFreeVariable,
    /// Apply head is neither a symbol expression nor an identifier
    ImplicitApplyNeedsIdentifier,
    /// Apply matched neither a symbol nor a procedure overload
    NoMatchingOverload,
    /// Symbol tuple whose first child is not a primary expression
    SymbolTupleNeedsIdentifier,
    /// Import of a module the module set does not contain
    UnknownModule,
    /// Internal error (a bug in the compiler)
    Internal,
}

impl ErrorKind {
    /// Human-readable name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "syntax error",
            ErrorKind::UndeclaredIdentifier => "undeclared identifier",
            ErrorKind::UndeclaredSymbol => "undeclared symbol",
            ErrorKind::SymbolRedefinition => "symbol redefinition",
            ErrorKind::UnboundFreeVariable => "unbound free variable",
            ErrorKind::ImplicitApplyNeedsIdentifier => "implicit apply needs identifier",
            ErrorKind::NoMatchingOverload => "no matching overload",
            ErrorKind::SymbolTupleNeedsIdentifier => "symbol tuple needs identifier",
            ErrorKind::UnknownModule => "unknown module",
            ErrorKind::Internal => "internal compiler error",
        }
    }
}

/// Diagnostic severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Secondary labeled span, pointing at related code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub span: Span,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// New error diagnostic.
    pub fn new(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self::with_severity(kind, Severity::Error, span, message)
    }

    /// New warning diagnostic.
    pub fn warning(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self::with_severity(kind, Severity::Warning, span, message)
    }

    fn with_severity(
        kind: ErrorKind,
        severity: Severity,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            span,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Attach a secondary labeled span.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.see(span, message);
        self
    }

    /// Attach a secondary labeled span, in place.
    ///
    /// This is the builder channel the resolution core uses to reference
    /// related declarations after the diagnostic has been appended.
    pub fn see(&mut self, span: Span, message: impl Into<String>) -> &mut Self {
        self.labels.push(Label {
            span,
            message: message.into(),
        });
        self
    }

    /// Attach a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.kind.name(), self.message)
    }
}

/// Append-only diagnostics sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error and return it for further labeling.
    pub fn error(
        &mut self,
        kind: ErrorKind,
        span: Span,
        message: impl Into<String>,
    ) -> &mut Diagnostic {
        self.push(Diagnostic::new(kind, span, message));
        self.diagnostics.last_mut().expect("just pushed")
    }

    /// Append a prepared diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// All diagnostics, in emission order.
    pub fn all(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of error-severity diagnostics. Monotonically non-decreasing.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Formats diagnostics with source code context.
pub struct DiagnosticFormatter<'a> {
    sources: &'a SourceMap,
}

impl<'a> DiagnosticFormatter<'a> {
    pub fn new(sources: &'a SourceMap) -> Self {
        Self { sources }
    }

    /// Format one diagnostic with location, snippet, and labels.
    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}\n", diagnostic));

        let (line, col) = self.sources.line_col(&diagnostic.span);
        let path = self.sources.file_path(&diagnostic.span);
        output.push_str(&format!("  --> {}:{}:{}\n", path.display(), line, col));

        let file = self.sources.file(&diagnostic.span);
        if let Some(text) = file.line_text(line) {
            let text = text.trim_end_matches('\n');
            output.push_str("   |\n");
            output.push_str(&format!("{:3} | {}\n", line, text));

            let start = col as usize;
            let width = (diagnostic.span.end - diagnostic.span.start) as usize;
            let underline =
                " ".repeat(start.saturating_sub(1)) + &"^".repeat(width.max(1));
            output.push_str(&format!("   | {}\n", underline));
        }

        for label in &diagnostic.labels {
            let (lline, lcol) = self.sources.line_col(&label.span);
            let lpath = self.sources.file_path(&label.span);
            output.push_str(&format!("   = note: {}\n", label.message));
            output.push_str(&format!(
                "     at {}:{}:{}\n",
                lpath.display(),
                lline,
                lcol
            ));
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("   = help: {}\n", note));
        }

        output
    }

    /// Format every diagnostic, separated by blank lines.
    pub fn format_all(&self, diagnostics: &[Diagnostic]) -> String {
        diagnostics
            .iter()
            .map(|d| self.format(d))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
