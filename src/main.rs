//! # Company facts CLI (`cfx`)
//!
//! ## Usage
//!
//! ```bash
//! cfx --config ./config/cfx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cfx init` | Create the SQLite database and run schema migrations |
//! | `cfx fetch` | Download and extract the bulk company-facts archive |
//! | `cfx transform` | Filter raw documents into the transformed directory |
//! | `cfx sync` | `fetch` followed by `transform` |
//! | `cfx load` | Store transformed documents in SQLite |
//! | `cfx get <cik>` | Print a stored document |
//! | `cfx stats` | Summarize the database and data directories |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use companyfacts::progress::ProgressMode;
use companyfacts::{acquire, batch, config, get, load, migrate, stats};

/// Company facts CLI: fetch the SEC bulk archive and reduce it to compact,
/// date-filtered per-filer documents.
#[derive(Parser)]
#[command(name = "cfx", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/cfx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Download the bulk archive and extract it into `paths.company_facts`.
    ///
    /// The directory is deleted and recreated first. The downloaded archive
    /// is removed afterwards, also when the fetch fails.
    Fetch {
        /// Progress output on stderr. Defaults to `human` on a TTY.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Transform raw documents into `paths.modified_facts`.
    ///
    /// Documents that fail to parse are reported and skipped; the run
    /// continues with the next file.
    Transform {
        /// Only process files whose name matches this glob (e.g. `CIK0000320193.json`).
        #[arg(long)]
        file: Option<String>,

        /// Transform without writing any output.
        #[arg(long)]
        dry_run: bool,

        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Fetch, then transform.
    Sync {
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Load transformed documents into the database, replacing by CIK.
    Load,

    /// Print a stored document by CIK (padding optional).
    Get { cik: String },

    /// Show database and directory statistics.
    Stats,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::warn!(
            "config file {} not found, using defaults",
            cli.config.display()
        );
        config::Config::minimal()
    };

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Fetch { progress } => {
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            acquire::run_fetch(&cfg, mode).await?;
        }
        Commands::Transform {
            file,
            dry_run,
            progress,
        } => {
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            batch::run_transform(&cfg, file.as_deref(), dry_run, mode)?;
        }
        Commands::Sync { progress } => {
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            acquire::run_fetch(&cfg, mode).await?;
            batch::run_transform(&cfg, None, false, mode)?;
        }
        Commands::Load => {
            migrate::run_migrations(&cfg).await?;
            load::run_load(&cfg).await?;
        }
        Commands::Get { cik } => {
            get::run_get(&cfg, &cik).await?;
        }
        Commands::Stats => {
            migrate::run_migrations(&cfg).await?;
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
