//! Types shared by the cmdsync error and logging facilities
//!
//! - **Schema constants**: canonical log field keys and event names
//! - **Sensitive data**: `Sensitive<T>` marker for automatic redaction

pub mod schema;
pub mod sensitive;

pub use sensitive::Sensitive;
