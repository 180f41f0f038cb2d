//! Operator-triggered forced reconcile

#![allow(clippy::result_large_err)]

use std::sync::{Arc, Weak};
use std::time::Instant;

use cmdsync_core::errors::{ExError, ExErrorKind, Result, SyncError};
use cmdsync_core::model::{Command, CommandSchema, Invocation, Response};
use cmdsync_core::{log_op_end, log_op_error, log_op_start};

use crate::reconcile::{ReconcileError, Reconciler};

pub const RELOAD_COMMAND_NAME: &str = "reload";

/// Force-reconcile one tenant
///
/// Returns the number of registered commands on success.
///
/// # Errors
///
/// The `ReconcileError` of the forced pass.
pub fn reload_tenant(
    reconciler: &Reconciler,
    tenant_id: &str,
) -> std::result::Result<usize, ReconcileError> {
    log_op_start!("reload", tenant_id = tenant_id);
    let start = Instant::now();

    match reconciler.reconcile_tenant(tenant_id, true) {
        Ok(_) => {
            let count = reconciler.registry().len();
            log_op_end!(
                "reload",
                duration_ms = start.elapsed().as_millis() as u64,
                tenant_id = tenant_id,
                commands = count as u64
            );
            Ok(count)
        }
        Err(e) => {
            log_op_error!(
                "reload",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                tenant_id = tenant_id
            );
            Err(e)
        }
    }
}

/// The `reload` slash command
///
/// Holds a weak handle because the reconciler owns the registry this
/// command is registered in.
pub struct ReloadCommand {
    reconciler: Weak<Reconciler>,
}

impl ReloadCommand {
    pub fn new(reconciler: &Arc<Reconciler>) -> Self {
        Self {
            reconciler: Arc::downgrade(reconciler),
        }
    }
}

impl Command for ReloadCommand {
    fn schema(&self) -> CommandSchema {
        CommandSchema::new(
            RELOAD_COMMAND_NAME,
            "Re-register every command in this server",
        )
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn execute(&self, invocation: &Invocation) -> Result<Response> {
        let tenant_id = invocation
            .tenant_id
            .as_deref()
            .ok_or_else(|| SyncError::TenantRequired {
                command_name: RELOAD_COMMAND_NAME.to_string(),
            })?;

        let reconciler = self.reconciler.upgrade().ok_or_else(|| {
            ExError::new(ExErrorKind::Internal)
                .with_op("reload")
                .with_message("reconciler has been dropped")
        })?;

        Ok(match reload_tenant(&reconciler, tenant_id) {
            Ok(count) => Response::ephemeral(format!("Reloaded {} commands.", count)),
            Err(e) => Response::ephemeral(format!("Reload failed: {}", e)),
        })
    }
}

impl std::fmt::Debug for ReloadCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadCommand")
            .field("attached", &(self.reconciler.strong_count() > 0))
            .finish()
    }
}
