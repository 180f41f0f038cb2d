//! Tenant reconcile command

use clap::Args;
use std::sync::Arc;

use cmdsync_engine::{reload_tenant, ReconcileError, ReconcileReport};

use crate::app::App;
use crate::config::AppConfig;
use crate::remote::HttpCommandApi;

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Tenant (guild) id
    #[arg(long)]
    pub tenant: String,

    /// Delete and recreate every command
    #[arg(long)]
    pub force: bool,
}

fn print_report(report: &ReconcileReport) {
    println!("Tenant {} synced:", report.tenant_id);
    println!("  created: {}", report.created.join(", "));
    println!("  updated: {}", report.updated.join(", "));
    println!("  skipped: {}", report.skipped.join(", "));
    if !report.deleted.is_empty() {
        println!("  deleted: {}", report.deleted.join(", "));
    }
    if !report.unversioned.is_empty() {
        println!("  unversioned: {}", report.unversioned.join(", "));
    }
    for failure in &report.delete_failures {
        println!("  delete failed: {}: {}", failure.command_name, failure.error);
    }
}

pub fn execute(
    args: SyncArgs,
    config: &AppConfig,
    db: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let remote = Arc::new(HttpCommandApi::from_config(config)?);
    let app = App::open(config, db, remote)?;

    let refresh = app.reconciler.refresh_local_versions();
    if !refresh.updated.is_empty() {
        println!("Versions advanced: {}", refresh.updated.join(", "));
    }

    if args.force {
        let count = reload_tenant(&app.reconciler, &args.tenant)?;
        println!("Reloaded {} commands in tenant {}", count, args.tenant);
        return Ok(());
    }

    match app.reconciler.reconcile_tenant(&args.tenant, false) {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(ReconcileError::Partial(report)) => {
            print_report(&report);
            Err(report.failure_summary().into())
        }
        Err(e) => Err(e.into()),
    }
}
