//! # SourceCheck CLI (`srccheck`)
//!
//! Checks a document for passages that overlap a reference corpus and,
//! optionally, pages found on the web.
//!
//! ## Usage
//!
//! ```bash
//! srccheck --config ./config/srccheck.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `srccheck check <path>` | Check a file (`-` reads stdin) |
//! | `srccheck corpus` | List indexed corpus documents |
//! | `srccheck serve` | Start the HTTP API server |
//!
//! ## Examples
//!
//! ```bash
//! # Check an essay against the local corpus
//! srccheck check essay.md
//!
//! # Also search the web, machine-readable output
//! srccheck check essay.md --web --json
//!
//! # Pipe text in
//! cat draft.txt | srccheck check -
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=debug` for detection statistics.

use clap::{Parser, Subcommand};
use sourcecheck::{check, config, server};
use sourcecheck_core::GatherOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SourceCheck CLI: lexical overlap detection against a reference corpus.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file falls back to built-in defaults.
#[derive(Parser)]
#[command(
    name = "srccheck",
    about = "SourceCheck: find passages of a document that overlap known sources",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/srccheck.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a document for overlapping passages.
    Check {
        /// File to check, or `-` for stdin.
        input: String,

        /// Gather additional sources from the web.
        #[arg(long)]
        web: bool,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,

        /// Maximum search queries derived from the text.
        #[arg(long)]
        max_queries: Option<usize>,

        /// Maximum result pages fetched per query.
        #[arg(long)]
        results_per_query: Option<usize>,
    },

    /// List indexed corpus documents.
    Corpus,

    /// Start the HTTP API server.
    Serve,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::debug!(path = %cli.config.display(), "no config file, using defaults");
        config::Config::minimal()
    };

    match cli.command {
        Commands::Check {
            input,
            web,
            json,
            max_queries,
            results_per_query,
        } => {
            let options = GatherOptions {
                max_queries,
                results_per_query,
            };
            check::run_check(&cfg, &input, web, options, json).await?;
        }
        Commands::Corpus => {
            check::run_corpus(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
