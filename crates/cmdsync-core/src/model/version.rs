//! Version records and semantic-version ordering

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SyncError;
use crate::model::command::CommandSchema;

/// Globally recorded version of one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalVersionRecord {
    /// Prefixed semantic version, e.g. `v1.2.0`
    pub version: String,
    /// When `version` last advanced; the signal propagated to tenants
    pub build_time: DateTime<Utc>,
}

/// Last successful apply of one command in one tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantVersionRecord {
    pub tenant_id: String,
    pub command_name: String,
    pub last_applied_time: DateTime<Utc>,
}

/// A command as currently registered on the remote platform for one tenant
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCommand {
    pub remote_id: String,
    pub name: String,
    pub schema: CommandSchema,
}

/// Parse a version string, tolerating a leading `v`
pub fn parse_version(raw: &str) -> Option<semver::Version> {
    let trimmed = raw.trim();
    let bare = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    semver::Version::parse(bare).ok()
}

/// Whether `declared` should replace `stored`
///
/// An empty or unparseable stored version is always older.
///
/// # Errors
///
/// `InvalidVersion` when `declared` itself is not a semantic version.
pub fn is_version_newer(declared: &str, stored: &str) -> Result<bool, SyncError> {
    let new = parse_version(declared).ok_or_else(|| SyncError::InvalidVersion {
        version: declared.to_string(),
    })?;

    Ok(match parse_version(stored) {
        Some(old) => new > old,
        None => true,
    })
}
