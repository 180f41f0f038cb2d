//! cmdsync engine - reconciliation of registered commands against the remote platform
//!
//! Coordinates the registry, version store and remote API:
//! - `refresh_local_versions` records declared versions once per process
//! - `reconcile_tenant` converges one tenant's remote commands
//! - `ReloadCommand` exposes a forced reconcile as a slash command
//! - `Lifecycle` wires both to startup, ready and tenant join/leave events
//!
//! ## Logging Ownership
//!
//! This crate owns `log_op_start!` / `log_op_end!` / `log_op_error!` for the
//! operations above. Core and store code only emit detail events.

pub mod config;
pub mod lifecycle;
pub mod plan;
pub mod reconcile;
pub mod reload;

pub use config::SyncConfig;
pub use lifecycle::Lifecycle;
pub use plan::{build_plan, DesiredCommand, PlannedAction, PlannedCommand, SyncPlan};
pub use reconcile::{CommandFailure, ReconcileError, ReconcileReport, Reconciler, RefreshReport};
pub use reload::{reload_tenant, ReloadCommand};
