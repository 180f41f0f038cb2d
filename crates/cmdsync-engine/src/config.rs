//! Engine configuration

use serde::Deserialize;

/// Knobs for the reconciliation engine
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Prefix stored in front of declared versions, e.g. `v` in `v1.2.0`
    pub version_prefix: String,
    /// Tenants reconciled in parallel during the ready fan-out
    pub startup_concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            version_prefix: "v".to_string(),
            startup_concurrency: 4,
        }
    }
}

impl SyncConfig {
    /// Declared version in stored form
    ///
    /// Versions that already carry the prefix are returned unchanged.
    pub fn tag_version(&self, declared: &str) -> String {
        let declared = declared.trim();
        if declared.starts_with(&self.version_prefix) {
            declared.to_string()
        } else {
            format!("{}{}", self.version_prefix, declared)
        }
    }
}
