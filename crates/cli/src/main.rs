//! optstore command-line entry point.
//!
//! Results are printed to stdout as JSON. Logging goes to stderr so the
//! output stays machine-readable.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use optstore_core::StoreConfig;
use tracing_subscriber::EnvFilter;

mod commands;
mod handlers;

use commands::Commands;
use handlers::Session;

#[derive(Parser)]
#[command(name = "optstore")]
#[command(author, version, about = "Prefixed cache and options store", long_about = None)]
struct Cli {
    /// Database path; overrides OPTSTORE_DB_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let mut config = StoreConfig::load()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    tracing::debug!(db_path = %config.db_path.display(), networked = config.networked, "opening store");
    let session = Session::open(config)?;

    let output = match cli.command {
        Commands::Cache { command } => handlers::cache(&session, command)?,
        Commands::Options { command } => handlers::options(&session, command)?,
        Commands::Setting { command } => handlers::settings(&session, command)?,
        Commands::Purge => handlers::purge(&session)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
