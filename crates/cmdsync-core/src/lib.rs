//! cmdsync core - command registry, version model and interaction routing
//!
//! This crate holds everything the reconciliation engine needs that does not
//! touch a database or the network:
//! - Command definitions, invocations and the concurrency-safe registry
//! - Local/tenant version records and semantic-version ordering
//! - The `VersionStore` and `RemoteCommandApi` seams (plus an in-memory store)
//! - Declared settings and their typed values
//! - Prefix routing for component and modal interactions
//! - The error and logging facilities shared by every crate

pub mod clock;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod registry;
pub mod remote;
pub mod router;
pub mod settings;
pub mod store;

/// Shared field vocabulary, re-exported for the logging macros
pub use cmdsync_core_types as types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{ExError, ExErrorKind, Result, SyncError};
pub use model::{Command, CommandSchema, Invocation, Response};
pub use registry::CommandRegistry;
pub use remote::RemoteCommandApi;
pub use router::{DispatchOutcome, Interaction, InteractionEvent, InteractionRouter};
pub use settings::SettingsCatalog;
pub use store::{MemoryVersionStore, VersionStore};
