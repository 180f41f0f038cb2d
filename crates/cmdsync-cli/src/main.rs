//! cmdsync CLI
//!
//! Operator interface for command version tracking and tenant sync

use clap::{Parser, Subcommand};

use cmdsync_core::logging_facility;

mod app;
mod catalog;
mod commands;
mod config;
mod remote;

#[derive(Debug, Parser)]
#[command(name = "cmdsync")]
#[command(about = "cmdsync - Versioned slash-command synchronisation", long_about = None)]
struct Cli {
    /// Database path (overrides configuration)
    #[arg(long, global = true)]
    db: Option<String>,

    /// Configuration file (defaults to ./cmdsync.toml when present)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Local version records
    Versions(commands::versions::VersionsArgs),
    /// Reconcile one tenant against the platform
    Sync(commands::sync::SyncArgs),
    /// Show what has been applied to a tenant
    Status(commands::status::StatusArgs),
    /// Read and write settings
    Settings(commands::settings::SettingsArgs),
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::AppConfig::load(cli.config.as_deref())?;
    logging_facility::init_with_filter(config.log_profile()?, Some(config.log_level.as_str()));

    let db = cli.db.unwrap_or_else(|| config.database_path.clone());
    tracing::debug!(db = %db, "Starting cmdsync");

    match cli.command {
        Commands::Versions(args) => commands::versions::execute(args, &config, &db),
        Commands::Sync(args) => commands::sync::execute(args, &config, &db),
        Commands::Status(args) => commands::status::execute(args, &config, &db),
        Commands::Settings(args) => commands::settings::execute(args, &config, &db),
    }
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
