//! Local version commands

use clap::{Args, Subcommand};
use std::sync::Arc;

use crate::app::App;
use crate::config::AppConfig;
use crate::remote::OfflineRemote;

#[derive(Debug, Args)]
pub struct VersionsArgs {
    #[command(subcommand)]
    pub command: VersionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum VersionsCommand {
    /// Record the declared version of every built-in command
    Refresh,
    /// Print stored local versions
    List,
}

pub fn execute(
    args: VersionsArgs,
    config: &AppConfig,
    db: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open(config, db, Arc::new(OfflineRemote))?;

    match args.command {
        VersionsCommand::Refresh => {
            let report = app.reconciler.refresh_local_versions();
            println!("Local versions refreshed:");
            println!("  updated: {}", report.updated.join(", "));
            println!("  unchanged: {}", report.unchanged.join(", "));
            if !report.removed.is_empty() {
                println!("  removed: {}", report.removed.join(", "));
            }
            for (name, version) in &report.invalid {
                println!("  invalid: {} ({})", name, version);
            }
            for failure in &report.errors {
                println!("  error: {}: {}", failure.command_name, failure.error);
            }
            if !report.errors.is_empty() {
                return Err(format!("{} command(s) could not be refreshed", report.errors.len()).into());
            }
        }
        VersionsCommand::List => {
            let records = app.store.list_local_versions()?;
            if records.is_empty() {
                println!("No local versions recorded");
            }
            for (name, record) in records {
                println!("{}\t{}\t{}", name, record.version, record.build_time.to_rfc3339());
            }
        }
    }

    Ok(())
}
