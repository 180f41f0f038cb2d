//! Canonical field keys and event names for structured logging
//!
//! Every crate logs through these so that log pipelines can filter on a
//! stable vocabulary.

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Reconciliation identifiers
pub const FIELD_TENANT_ID: &str = "tenant_id";
pub const FIELD_COMMAND_NAME: &str = "command_name";
pub const FIELD_REMOTE_ID: &str = "remote_id";
pub const FIELD_FORCE: &str = "force";

// Pass counters
pub const FIELD_SUCCEEDED: &str = "succeeded";
pub const FIELD_SKIPPED: &str = "skipped";
pub const FIELD_FAILED: &str = "failed";

// Interaction routing
pub const FIELD_CUSTOM_ID: &str = "custom_id";
pub const FIELD_PREFIX: &str = "prefix";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
