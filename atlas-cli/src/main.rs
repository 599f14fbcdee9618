//! Atlas CLI - extract the architecture of a repository.
//!
//! Atlas statically scans one repository (or several, via a solution config)
//! and writes a single JSON document describing its components, symbols,
//! relationships, and documentation.
//!
//! # Usage
//!
//! ```bash
//! # Analyze the current directory
//! atlas
//!
//! # Analyze a specific repository into a chosen file
//! atlas ~/code/shop -o shop-architecture.json
//!
//! # Merge several repositories from a solution config
//! atlas --config solution.json -o merged.json
//! ```

use atlas_model::Architecture;
use atlas_scan::{Orchestrator, OrchestratorError, ScanError, ScanOptions, Scanner};
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

mod output;

/// Atlas - extract repository architecture into a JSON document
#[derive(Parser)]
#[command(name = "atlas")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Repository root to analyze
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Output file for the architecture document
    #[arg(long, short, default_value = "architecture.json")]
    output: PathBuf,

    /// Multi-repo solution config; overrides the positional path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip files larger than this many bytes
    #[arg(long, default_value_t = 500_000)]
    max_file_size: u64,

    /// Cap on emitted symbols (0 = unlimited)
    #[arg(long, default_value_t = 5000)]
    max_symbols: usize,

    /// Lines of code kept in each symbol preview
    #[arg(long, default_value_t = 5)]
    preview_lines: usize,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error("failed to create tokio runtime")]
    Runtime(#[source] std::io::Error),

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize architecture document")]
    Serialize(#[from] serde_json::Error),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        output::error(&format!("{e}"));
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            output::error(&format!("  caused by: {cause}"));
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let options = ScanOptions {
        max_file_size: cli.max_file_size,
        max_symbols: cli.max_symbols,
        preview_lines: cli.preview_lines,
    };

    let arch = match &cli.config {
        Some(config_path) => {
            output::info(&format!("Merging solution from {}", config_path.display()));
            let orchestrator = Orchestrator::load(config_path, options)?;
            // Cloning and scanning run inside a runtime built on demand.
            let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
            runtime.block_on(orchestrator.run())?
        }
        None => {
            output::info(&format!("Analyzing {}", cli.path.display()));
            Scanner::new(&cli.path, options)?.scan()?
        }
    };

    write_document(&arch, &cli.output, cli.compact)?;

    output::success(&format!(
        "Architecture written to {}",
        cli.output.display()
    ));
    output::stat("components", arch.stats.total_components);
    output::stat("relationships", arch.stats.total_relationships);
    output::stat("files", arch.stats.total_files);
    output::stat("lines", arch.stats.total_lines);
    output::stat("symbols", arch.stats.total_symbols);
    if let Some(language) = arch.stats.primary_language() {
        output::stat("primary language", language);
    }
    for (language, lines) in &arch.stats.languages {
        output::stat(&format!("  {language}"), format!("{lines} lines"));
    }

    Ok(())
}

fn write_document(arch: &Architecture, path: &PathBuf, compact: bool) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| CliError::Write {
                path: path.clone(),
                source,
            })?;
        }
    }
    let json = if compact {
        serde_json::to_string(arch)?
    } else {
        serde_json::to_string_pretty(arch)?
    };
    std::fs::write(path, json).map_err(|source| CliError::Write {
        path: path.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_write_document_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out/architecture.json");
        let arch = Architecture::new("demo", "/tmp/demo");

        write_document(&arch, &out, true).unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        let back: Architecture = serde_json::from_str(&content).unwrap();
        assert_eq!(back.name, "demo");
    }

    #[test]
    fn test_default_args() {
        let cli = Cli::parse_from(["atlas"]);
        assert_eq!(cli.path, PathBuf::from("."));
        assert_eq!(cli.output, PathBuf::from("architecture.json"));
        assert_eq!(cli.max_file_size, 500_000);
        assert_eq!(cli.max_symbols, 5000);
        assert_eq!(cli.preview_lines, 5);
        assert!(!cli.compact);
        assert!(cli.config.is_none());
    }
}
