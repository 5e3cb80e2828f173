//! Sigil command-line driver.
//!
//! Loads source files (one module per file, named by file stem), runs the
//! front-end, and reports diagnostics. `--emit-ast` prints the resolved
//! module set as JSON.

use clap::Parser;
use sigil_front::error::DiagnosticFormatter;
use sigil_front::compile::compile_sources;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sigil")]
#[command(about = "Check Sigil sources and report resolution diagnostics")]
struct Cli {
    /// Source files (.sgl); each becomes a module named by its file stem
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print the resolved module set as JSON
    #[arg(long)]
    emit_ast: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sigil=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut sources = Vec::new();
    for path in &cli.files {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| "main".to_string());
        match std::fs::read_to_string(path) {
            Ok(text) => sources.push((name, text)),
            Err(e) => {
                error!("failed to read {}: {}", path.display(), e);
                std::process::exit(2);
            }
        }
    }

    let borrowed: Vec<(&str, &str)> = sources
        .iter()
        .map(|(name, text)| (name.as_str(), text.as_str()))
        .collect();
    let output = compile_sources(&borrowed);

    if !output.diagnostics.is_empty() {
        let formatter = DiagnosticFormatter::new(&output.sources);
        eprintln!("{}", formatter.format_all(output.diagnostics.all()));
    }

    if cli.emit_ast {
        match serde_json::to_string_pretty(&output.world) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("failed to serialize module set: {}", e);
                std::process::exit(2);
            }
        }
    }

    if output.has_errors() {
        std::process::exit(1);
    }
}
