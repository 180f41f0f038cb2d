//! Setting get/set commands

use clap::{Args, Subcommand};
use std::sync::Arc;

use cmdsync_core::errors::SyncError;
use cmdsync_core::model::SettingScope;
use cmdsync_core::router::{DispatchOutcome, InteractionEvent};

use crate::app::App;
use crate::catalog::{SETTING_MODAL_PREFIX, SETTING_VALUE_FIELD};
use crate::config::AppConfig;
use crate::remote::OfflineRemote;

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print a setting (its default when unset)
    Get(TargetArgs),
    /// Validate and store a setting
    Set {
        #[command(flatten)]
        target: TargetArgs,
        value: String,
    },
    /// List declared settings
    List,
}

#[derive(Debug, Args)]
pub struct TargetArgs {
    /// `tenant` (alias `guild`) or `user`
    #[arg(long)]
    pub scope: SettingScope,

    /// Tenant or user id
    #[arg(long)]
    pub target: String,

    pub key: String,
}

/// The operator holds every permission bit
const OPERATOR_PERMISSIONS: u64 = u64::MAX;

pub fn execute(
    args: SettingsArgs,
    config: &AppConfig,
    db: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open(config, db, Arc::new(OfflineRemote))?;
    let catalog = app.registry.settings();

    match args.command {
        SettingsCommand::Get(t) => {
            let value = catalog.get_value(app.store.as_ref(), t.scope, &t.target, &t.key)?;
            println!("{}", value);
        }
        SettingsCommand::Set { target: t, value } => {
            let def = catalog.get(&t.key).ok_or_else(|| SyncError::UnknownSetting {
                key: t.key.clone(),
            })?;
            if def.scope != t.scope {
                return Err(format!("{} is a {} setting", t.key, def.scope.as_str()).into());
            }

            // Submitted the same way as the settings modal
            let mut event =
                InteractionEvent::new(format!("{}{}", SETTING_MODAL_PREFIX, t.key), &t.target)
                    .with_permissions(OPERATOR_PERMISSIONS)
                    .with_value(SETTING_VALUE_FIELD, value);
            if t.scope == SettingScope::Tenant {
                event = event.in_tenant(&t.target);
            }
            match app.router.dispatch_modal(&event) {
                DispatchOutcome::Handled { .. } => {}
                DispatchOutcome::HandlerFailed { error, .. } => return Err(error.into()),
                DispatchOutcome::Unmatched => {
                    return Err("settings modal handler is not registered".into())
                }
            }

            let stored = catalog.get_value(app.store.as_ref(), t.scope, &t.target, &t.key)?;
            println!("{} = {}", t.key, stored);
        }
        SettingsCommand::List => {
            for def in catalog.definitions() {
                println!(
                    "{}\t{}\t{}\tdefault={}",
                    def.key,
                    def.module,
                    def.scope.as_str(),
                    def.default
                );
            }
        }
    }
    Ok(())
}
