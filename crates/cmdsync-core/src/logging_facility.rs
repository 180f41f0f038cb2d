//! Structured logging facility for cmdsync
//!
//! - Single initialization point via `init(profile)`
//! - Boundary macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! # Usage
//!
//! ```rust
//! use cmdsync_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```
//!
//! The engine layer owns start/end logging for its operations
//! (`refresh_local_versions`, `reconcile_tenant`, `reload`); registry,
//! router and store code only emit `tracing::debug!`/`warn!` details.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, init_with_filter, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
