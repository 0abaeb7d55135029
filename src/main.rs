//! # Scholask CLI (`scholask`)
//!
//! ## Usage
//!
//! ```bash
//! scholask --config ./config/scholask.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scholask ingest <tenant>` | Chunk text/files/directories and rebuild the tenant index |
//! | `scholask search <tenant> "<query>"` | Ranked passages with citation numbers |
//! | `scholask ask <tenant> "<question>"` | Grounded answer with sources |
//! | `scholask facts <tenant>` | Starter quick facts |
//! | `scholask status <tenant>` | Chunk count and artifact rows |
//!
//! ## Examples
//!
//! ```bash
//! scholask ingest seattle-central --dir ./docs --config ./config/scholask.toml
//! scholask ask seattle-central "When is the application deadline?"
//! RUST_LOG=scholask=debug scholask search seattle-central "tuition" --json
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scholask::commands::{self, IngestInputs};
use scholask::config;
use scholask::engine::Engine;
use scholask::facts::DEFAULT_FACT_LIMIT;

/// Scholask CLI: per-tenant retrieval and grounded answers.
#[derive(Parser)]
#[command(
    name = "scholask",
    about = "Scholask: per-tenant retrieval and grounded answers",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/scholask.toml")]
    config: PathBuf,

    /// Log at info level (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk the given inputs and rebuild the tenant's index once.
    Ingest {
        tenant: String,

        /// Inline text. Repeatable.
        #[arg(long = "text")]
        texts: Vec<String>,

        /// Plain-text file. Repeatable.
        #[arg(long = "file")]
        files: Vec<PathBuf>,

        /// Directory of `.md`/`.txt` files. Repeatable.
        #[arg(long = "dir")]
        dirs: Vec<PathBuf>,

        /// Source URL recorded for inline texts and files.
        #[arg(long)]
        source_url: Option<String>,
    },

    /// Search a tenant's index.
    Search {
        tenant: String,
        query: String,

        /// Number of results (default: `retrieval.top_k`).
        #[arg(long)]
        k: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Answer a question from a tenant's index.
    Ask {
        tenant: String,
        question: String,

        #[arg(long)]
        k: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Answer the starter questions for a tenant.
    Facts {
        tenant: String,

        #[arg(long, default_value_t = DEFAULT_FACT_LIMIT)]
        limit: usize,
    },

    /// Show chunk and artifact row counts for a tenant.
    Status { tenant: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "info" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cfg = config::load_config(&cli.config)?;
    let engine = Engine::from_config(cfg)?;

    match cli.command {
        Commands::Ingest {
            tenant,
            texts,
            files,
            dirs,
            source_url,
        } => {
            let inputs = IngestInputs {
                texts,
                files,
                dirs,
                source_url,
            };
            commands::run_ingest(&engine, &tenant, inputs).await?;
        }
        Commands::Search {
            tenant,
            query,
            k,
            json,
        } => {
            commands::run_search(&engine, &tenant, &query, k, json).await?;
        }
        Commands::Ask {
            tenant,
            question,
            k,
            json,
        } => {
            commands::run_ask(&engine, &tenant, &question, k, json).await?;
        }
        Commands::Facts { tenant, limit } => {
            commands::run_facts(&engine, &tenant, limit).await?;
        }
        Commands::Status { tenant } => {
            commands::run_status(&engine, &tenant).await?;
        }
    }

    Ok(())
}
