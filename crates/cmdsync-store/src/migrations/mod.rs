//! Migration framework
//!
//! - Embedded SQL migrations applied in order, each in its own transaction
//! - Idempotent re-application
//! - Checksum verification of already-applied migrations

mod checksums;
mod embedded;
mod runner;

pub use embedded::{get_migrations, Migration};
pub use runner::{applied_migrations, apply_migrations};
