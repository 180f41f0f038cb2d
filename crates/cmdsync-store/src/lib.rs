//! cmdsync store - SQLite persistence for command versions and settings
//!
//! Provides:
//! - Connection helpers and pragmas
//! - Embedded, checksummed schema migrations
//! - `SqliteVersionStore`, the durable `VersionStore` implementation

pub mod db;
pub mod errors;
pub mod migrations;
pub mod sqlite_store;

pub use errors::Result;
pub use sqlite_store::SqliteVersionStore;
