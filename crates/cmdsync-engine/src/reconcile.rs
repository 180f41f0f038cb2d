//! Version refresh and per-tenant reconciliation
//!
//! ## Logging Ownership
//!
//! `refresh_local_versions` and `reconcile_tenant` emit the start/end/error
//! boundary events; per-command outcomes are `debug!`/`warn!` details.

#![allow(clippy::result_large_err)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use cmdsync_core::clock::Clock;
use cmdsync_core::errors::{ExError, ExErrorKind};
use cmdsync_core::model::{is_version_newer, LocalVersionRecord, RemoteCommand};
use cmdsync_core::registry::CommandRegistry;
use cmdsync_core::remote::RemoteCommandApi;
use cmdsync_core::store::VersionStore;
use cmdsync_core::{log_op_end, log_op_error, log_op_start};

use crate::config::SyncConfig;
use crate::plan::{build_plan, DesiredCommand, PlannedAction};

/// A command that could not be processed, with its cause
#[derive(Debug, Clone)]
pub struct CommandFailure {
    pub command_name: String,
    pub error: ExError,
}

impl CommandFailure {
    fn new(command_name: impl Into<String>, error: ExError) -> Self {
        Self {
            command_name: command_name.into(),
            error,
        }
    }
}

/// Outcome of `refresh_local_versions`
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    /// Version advanced (or first recorded)
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    /// `(command, declared version)` pairs that are not semantic versions
    pub invalid: Vec<(String, String)>,
    /// Stored records dropped because the command is no longer registered
    pub removed: Vec<String>,
    pub errors: Vec<CommandFailure>,
}

impl RefreshReport {
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty() && self.errors.is_empty()
    }
}

/// Outcome of one `reconcile_tenant` pass
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub tenant_id: String,
    pub force: bool,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub skipped: Vec<String>,
    /// Registered but never recorded locally; left untouched
    pub unversioned: Vec<String>,
    /// Remote commands removed (obsolete, duplicate, or force-cleared)
    pub deleted: Vec<String>,
    /// Create/update failures; these make the pass an error
    pub failures: Vec<CommandFailure>,
    /// Delete failures; reported only
    pub delete_failures: Vec<CommandFailure>,
}

impl ReconcileReport {
    fn new(tenant_id: &str, force: bool) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            force,
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> usize {
        self.created.len() + self.updated.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failures
            .iter()
            .map(|f| f.command_name.as_str())
            .collect()
    }

    /// `"name: cause"` for every failed command, joined
    pub fn failure_summary(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("{}: {}", f.command_name, f.error))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Error, Debug, Clone)]
pub enum ReconcileError {
    /// The remote snapshot could not be read; nothing was changed
    #[error("Failed to fetch remote commands for tenant {tenant_id}: {source}")]
    Fetch { tenant_id: String, source: ExError },

    /// Every command was attempted and at least one failed
    #[error("{}", partial_message(.0))]
    Partial(ReconcileReport),

    /// The pass panicked; the remote and store may be half-converged
    #[error("Sync of tenant {tenant_id} aborted unexpectedly")]
    Aborted { tenant_id: String },
}

fn partial_message(report: &ReconcileReport) -> String {
    format!(
        "Failed to sync {} command(s) in tenant {} (succeeded={}, skipped={}, failed={}): {}",
        report.failed(),
        report.tenant_id,
        report.succeeded(),
        report.skipped_count(),
        report.failed(),
        report.failure_summary()
    )
}

impl ReconcileError {
    pub fn tenant_id(&self) -> &str {
        match self {
            ReconcileError::Fetch { tenant_id, .. } | ReconcileError::Aborted { tenant_id } => {
                tenant_id
            }
            ReconcileError::Partial(report) => &report.tenant_id,
        }
    }

    /// The partial report, when the pass got past the fetch
    pub fn report(&self) -> Option<&ReconcileReport> {
        match self {
            ReconcileError::Partial(report) => Some(report),
            ReconcileError::Fetch { .. } | ReconcileError::Aborted { .. } => None,
        }
    }
}

impl From<ReconcileError> for ExError {
    fn from(err: ReconcileError) -> Self {
        let message = err.to_string();
        match err {
            ReconcileError::Fetch { tenant_id, source } => {
                ExError::new(ExErrorKind::ExternalService)
                    .with_op("remote_list")
                    .with_tenant_id(tenant_id)
                    .with_message(message)
                    .with_source(source)
            }
            ReconcileError::Partial(report) => ExError::new(ExErrorKind::PartialSync)
                .with_op("reconcile_tenant")
                .with_tenant_id(report.tenant_id)
                .with_message(message),
            ReconcileError::Aborted { tenant_id } => ExError::new(ExErrorKind::Internal)
                .with_op("reconcile_tenant")
                .with_tenant_id(tenant_id)
                .with_message(message),
        }
    }
}

/// Drives local version refresh and tenant reconciliation
pub struct Reconciler {
    config: SyncConfig,
    registry: Arc<CommandRegistry>,
    store: Arc<dyn VersionStore>,
    remote: Arc<dyn RemoteCommandApi>,
    clock: Arc<dyn Clock>,
}

impl Reconciler {
    pub fn new(
        config: SyncConfig,
        registry: Arc<CommandRegistry>,
        store: Arc<dyn VersionStore>,
        remote: Arc<dyn RemoteCommandApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            registry,
            store,
            remote,
            clock,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn VersionStore> {
        &self.store
    }

    /// Record declared versions and drop records of unregistered commands
    ///
    /// Never touches the remote API. A record is only written when the
    /// declared version is strictly newer than the stored one; its build time
    /// never moves backwards.
    pub fn refresh_local_versions(&self) -> RefreshReport {
        log_op_start!("refresh_local_versions");
        let start = Instant::now();
        let mut report = RefreshReport::default();
        let mut registered = BTreeSet::new();

        for command in self.registry.all() {
            let name = command.schema().name.to_lowercase();
            registered.insert(name.clone());
            let declared = self.config.tag_version(command.version());
            self.refresh_one(&name, &declared, &mut report);
        }

        match self.store.list_local_command_names() {
            Ok(stored) => {
                for name in stored.into_iter().filter(|n| !registered.contains(n)) {
                    match self.store.delete_local_version(&name) {
                        Ok(()) => {
                            tracing::info!(command = %name, "Removed version of unregistered command");
                            report.removed.push(name);
                        }
                        Err(e) => report.errors.push(CommandFailure::new(name, e)),
                    }
                }
            }
            Err(e) => report.errors.push(CommandFailure::new("*", e)),
        }

        for failure in &report.errors {
            tracing::warn!(
                command = %failure.command_name,
                err.code = failure.error.code(),
                error = %failure.error,
                "Local version refresh failed for command"
            );
        }

        log_op_end!(
            "refresh_local_versions",
            duration_ms = start.elapsed().as_millis() as u64,
            updated = report.updated.len() as u64,
            unchanged = report.unchanged.len() as u64,
            invalid = report.invalid.len() as u64,
            removed = report.removed.len() as u64,
            failed = report.errors.len() as u64
        );
        report
    }

    fn refresh_one(&self, name: &str, declared: &str, report: &mut RefreshReport) {
        let stored = match self.store.get_local_version(name) {
            Ok(stored) => stored,
            Err(e) => {
                report.errors.push(CommandFailure::new(name, e));
                return;
            }
        };

        let stored_version = stored.as_ref().map(|r| r.version.as_str()).unwrap_or("");
        let newer = match is_version_newer(declared, stored_version) {
            Ok(newer) => newer,
            Err(e) => {
                tracing::warn!(command = %name, version = %declared, error = %e, "Invalid declared version");
                report.invalid.push((name.to_string(), declared.to_string()));
                return;
            }
        };

        if !newer {
            report.unchanged.push(name.to_string());
            return;
        }

        let now = self.clock.now();
        let build_time = match &stored {
            Some(previous) if previous.build_time > now => previous.build_time,
            _ => now,
        };
        let record = LocalVersionRecord {
            version: declared.to_string(),
            build_time,
        };

        match self.store.put_local_version(name, &record) {
            Ok(()) => {
                tracing::info!(
                    command = %name,
                    from = %stored_version,
                    to = %declared,
                    "Command version advanced"
                );
                report.updated.push(name.to_string());
            }
            Err(e) => report.errors.push(CommandFailure::new(name, e)),
        }
    }

    /// Converge one tenant's remote commands with the registry
    ///
    /// # Errors
    ///
    /// - `Fetch` when the remote snapshot cannot be read (no side effects)
    /// - `Partial` when any create or update failed; every other command was
    ///   still attempted and successful applies are persisted
    pub fn reconcile_tenant(
        &self,
        tenant_id: &str,
        force: bool,
    ) -> std::result::Result<ReconcileReport, ReconcileError> {
        log_op_start!("reconcile_tenant", tenant_id = tenant_id, force = force);
        let start = Instant::now();

        let result = self.reconcile_tenant_impl(tenant_id, force);
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(report) => {
                log_op_end!(
                    "reconcile_tenant",
                    duration_ms = duration_ms,
                    tenant_id = tenant_id,
                    succeeded = report.succeeded() as u64,
                    skipped = report.skipped_count() as u64,
                    deleted = report.deleted.len() as u64
                );
            }
            Err(e) => {
                log_op_error!(
                    "reconcile_tenant",
                    e.clone(),
                    duration_ms = duration_ms,
                    tenant_id = tenant_id
                );
            }
        }

        result
    }

    fn reconcile_tenant_impl(
        &self,
        tenant_id: &str,
        force: bool,
    ) -> std::result::Result<ReconcileReport, ReconcileError> {
        let mut snapshot = self
            .remote
            .list(tenant_id)
            .map_err(|source| ReconcileError::Fetch {
                tenant_id: tenant_id.to_string(),
                source,
            })?;

        let mut report = ReconcileReport::new(tenant_id, force);
        let desired = self.gather_desired(tenant_id, &mut report);

        // A cleared command has no record until its re-create succeeds
        if force {
            for cmd in std::mem::take(&mut snapshot) {
                self.delete_remote(tenant_id, &cmd, true, &mut report);
            }
        }

        let plan = build_plan(&desired, &snapshot, force);
        tracing::debug!(
            tenant_id,
            deletions = plan.deletions.len() as u64,
            mutations = plan.mutation_count() as u64,
            "Planned tenant sync"
        );

        for cmd in &plan.deletions {
            self.delete_remote(tenant_id, cmd, true, &mut report);
        }

        for planned in plan.commands {
            let name = planned.name;
            let applied = match planned.action {
                PlannedAction::Unversioned => {
                    tracing::warn!(
                        tenant_id,
                        command = %name,
                        "No local version recorded, skipping command"
                    );
                    report.unversioned.push(name);
                    continue;
                }
                PlannedAction::Skip => {
                    tracing::debug!(tenant_id, command = %name, "Command up to date");
                    report.skipped.push(name);
                    continue;
                }
                PlannedAction::Create => self
                    .remote
                    .create(tenant_id, &planned.schema)
                    .map(|remote_id| {
                        tracing::debug!(tenant_id, command = %name, remote_id = %remote_id, "Created command");
                        true
                    }),
                PlannedAction::Update { remote_id } => self
                    .remote
                    .update(tenant_id, &remote_id, &planned.schema)
                    .map(|()| {
                        tracing::debug!(tenant_id, command = %name, remote_id = %remote_id, "Updated command");
                        false
                    }),
            };

            match applied {
                Ok(created) => {
                    self.record_applied(tenant_id, &name);
                    if created {
                        report.created.push(name);
                    } else {
                        report.updated.push(name);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        tenant_id,
                        command = %name,
                        err.code = e.code(),
                        error = %e,
                        "Failed to apply command"
                    );
                    let e = e.with_tenant_id(tenant_id).with_command_name(name.clone());
                    report.failures.push(CommandFailure::new(name, e));
                }
            }
        }

        if report.failures.is_empty() {
            Ok(report)
        } else {
            Err(ReconcileError::Partial(report))
        }
    }

    /// Registered commands with their local and tenant records
    ///
    /// A failed local read is a command failure. A failed tenant read counts
    /// as "never applied".
    fn gather_desired(&self, tenant_id: &str, report: &mut ReconcileReport) -> Vec<DesiredCommand> {
        let mut desired = Vec::new();
        for command in self.registry.all() {
            let schema = command.schema();
            let name = schema.name.to_lowercase();

            let local = match self.store.get_local_version(&name) {
                Ok(local) => local,
                Err(e) => {
                    report.failures.push(CommandFailure::new(name, e));
                    continue;
                }
            };

            let tenant_applied = match self.store.get_tenant_last_applied(tenant_id, &name) {
                Ok(applied) => applied,
                Err(e) => {
                    tracing::warn!(
                        tenant_id,
                        command = %name,
                        error = %e,
                        "Tenant version read failed, treating as needing update"
                    );
                    None
                }
            };

            desired.push(DesiredCommand {
                name,
                schema,
                local,
                tenant_applied,
            });
        }
        desired
    }

    fn delete_remote(
        &self,
        tenant_id: &str,
        cmd: &RemoteCommand,
        drop_record: bool,
        report: &mut ReconcileReport,
    ) {
        match self.remote.delete(tenant_id, &cmd.remote_id) {
            Ok(()) => {
                tracing::debug!(tenant_id, command = %cmd.name, remote_id = %cmd.remote_id, "Deleted command");
                if drop_record {
                    if let Err(e) = self
                        .store
                        .delete_tenant_version(tenant_id, &cmd.name.to_lowercase())
                    {
                        tracing::warn!(tenant_id, command = %cmd.name, error = %e, "Failed to delete tenant version record");
                    }
                }
                report.deleted.push(cmd.name.clone());
            }
            Err(e) => {
                tracing::warn!(
                    tenant_id,
                    command = %cmd.name,
                    err.code = e.code(),
                    error = %e,
                    "Failed to delete command"
                );
                report
                    .delete_failures
                    .push(CommandFailure::new(cmd.name.clone(), e));
            }
        }
    }

    fn record_applied(&self, tenant_id: &str, name: &str) {
        if let Err(e) = self
            .store
            .put_tenant_last_applied(tenant_id, name, self.clock.now())
        {
            tracing::warn!(
                tenant_id,
                command = %name,
                error = %e,
                "Applied command but failed to record it; next pass will reapply"
            );
        }
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
