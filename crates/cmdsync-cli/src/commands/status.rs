//! Tenant status command

use clap::Args;
use std::sync::Arc;

use crate::app::App;
use crate::config::AppConfig;
use crate::remote::OfflineRemote;

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Tenant (guild) id
    #[arg(long)]
    pub tenant: String,
}

pub fn execute(
    args: StatusArgs,
    config: &AppConfig,
    db: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open(config, db, Arc::new(OfflineRemote))?;

    let applied = app.store.list_tenant_versions(&args.tenant)?;
    if applied.is_empty() {
        println!("No commands applied in tenant {}", args.tenant);
        return Ok(());
    }

    for record in applied {
        let stale = match app.store.get_local_version(&record.command_name)? {
            Some(local) if local.build_time > record.last_applied_time => " (stale)",
            Some(_) => "",
            None => " (unregistered)",
        };
        println!(
            "{}\t{}{}",
            record.command_name,
            record.last_applied_time.to_rfc3339(),
            stale
        );
    }
    Ok(())
}
