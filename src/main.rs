//! # Schema Harness CLI (`shx`)
//!
//! ## Usage
//!
//! ```bash
//! shx --config ./config/shx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shx init` | Create the SQLite database and run migrations |
//! | `shx ingest <path>` | Ingest JSON / JSONL documents as raw records |
//! | `shx infer` | Run an inference pass now |
//! | `shx history` | List schema versions |
//! | `shx show <version>` | Print one schema version |
//! | `shx diff <a> <b>` | Compare two schema versions |
//! | `shx stats` | Record and version counts |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use schema_harness::{config, history, ingest, logging, migrate, stats};

/// Schema Harness CLI: structural schema inference and versioning for
/// semi-structured documents.
#[derive(Parser)]
#[command(
    name = "shx",
    about = "Schema Harness — structural schema inference and versioning for ingested documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the raw_records and
    /// schema_versions tables. Safe to run repeatedly.
    Init,

    /// Ingest documents from a file or directory.
    ///
    /// Accepts `.json` (one document or an array), `.jsonl` and `.ndjson`.
    /// Every document is stored as a raw record; schema inference runs in
    /// the background and is awaited before the command exits.
    Ingest {
        /// File or directory to read.
        path: PathBuf,

        /// Source tag stored with each record.
        #[arg(long, default_value = "cli")]
        source: String,

        /// Override `[inference].sample_size` for the triggered passes.
        #[arg(long)]
        sample_size: Option<usize>,
    },

    /// Run one inference pass now and create a version if the schema drifted.
    Infer {
        /// Number of most recent records to sample.
        #[arg(long)]
        sample_size: Option<usize>,

        /// Free-text notes stored with a newly created version.
        #[arg(long)]
        notes: Option<String>,
    },

    /// List all schema versions.
    History,

    /// Print one schema version.
    Show {
        version: i64,

        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compare two schema versions.
    Diff {
        /// The "before" version.
        from: i64,
        /// The "after" version.
        to: i64,

        /// Print the diff as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show record and schema version statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest {
            path,
            source,
            sample_size,
        } => {
            ingest::run_ingest(&cfg, &path, &source, sample_size).await?;
        }
        Commands::Infer { sample_size, notes } => {
            history::run_infer(&cfg, sample_size, notes).await?;
        }
        Commands::History => {
            history::run_history(&cfg).await?;
        }
        Commands::Show { version, json } => {
            history::run_show(&cfg, version, json).await?;
        }
        Commands::Diff { from, to, json } => {
            history::run_diff(&cfg, from, to, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
