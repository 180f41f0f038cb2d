//! Catalog of declared settings and typed access to stored values

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::errors::SyncError;
use crate::model::{SettingDefinition, SettingScope, SettingValue};
use crate::store::VersionStore;

/// Registry of setting definitions
///
/// Populated as a side effect of command registration. Values themselves
/// live in the version store; the catalog only knows how to parse, validate
/// and default them.
#[derive(Debug, Default)]
pub struct SettingsCatalog {
    definitions: RwLock<HashMap<String, SettingDefinition>>,
}

impl SettingsCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a definition by key
    pub fn register(&self, definition: SettingDefinition) {
        tracing::debug!(key = %definition.key, module = %definition.module, "Registered setting");
        self.definitions
            .write()
            .insert(definition.key.clone(), definition);
    }

    pub fn get(&self, key: &str) -> Option<SettingDefinition> {
        self.definitions.read().get(key).cloned()
    }

    /// All definitions sorted by module, then key
    pub fn definitions(&self) -> Vec<SettingDefinition> {
        let mut defs: Vec<_> = self.definitions.read().values().cloned().collect();
        defs.sort_by(|a, b| (&a.module, &a.key).cmp(&(&b.module, &b.key)));
        defs
    }

    /// Definitions applicable to one scope
    pub fn definitions_for(&self, scope: SettingScope) -> Vec<SettingDefinition> {
        self.definitions()
            .into_iter()
            .filter(|d| d.scope == scope)
            .collect()
    }

    /// Read a value, falling back to the declared default
    ///
    /// A missing row, an empty value, a store read failure, or a stored
    /// value that no longer parses all yield the default.
    ///
    /// # Errors
    ///
    /// `UnknownSetting` if `key` was never declared.
    pub fn get_value(
        &self,
        store: &dyn VersionStore,
        scope: SettingScope,
        target_id: &str,
        key: &str,
    ) -> Result<SettingValue, SyncError> {
        let def = self.get(key).ok_or_else(|| SyncError::UnknownSetting {
            key: key.to_string(),
        })?;

        let raw = match store.get_setting(scope, target_id, key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return Ok(def.default),
            Err(e) => {
                tracing::warn!(key, target_id, error = %e, "Setting read failed, using default");
                return Ok(def.default);
            }
        };

        match SettingValue::parse(&def.kind, &raw) {
            Ok(value) => Ok(value),
            Err(reason) => {
                tracing::warn!(key, target_id, reason = %reason, "Stored setting unparseable, using default");
                Ok(def.default)
            }
        }
    }

    /// Parse, validate and persist a value
    ///
    /// # Errors
    ///
    /// - `UnknownSetting` if `key` was never declared
    /// - `InvalidSettingValue` if parsing or the validator rejects `raw`
    /// - `Internal` wrapping the store error if the write fails
    pub fn set_value(
        &self,
        store: &dyn VersionStore,
        scope: SettingScope,
        target_id: &str,
        key: &str,
        raw: &str,
    ) -> Result<SettingValue, SyncError> {
        let def = self.get(key).ok_or_else(|| SyncError::UnknownSetting {
            key: key.to_string(),
        })?;

        let invalid = |reason: String| SyncError::InvalidSettingValue {
            key: key.to_string(),
            reason,
        };

        let value = SettingValue::parse(&def.kind, raw).map_err(invalid)?;
        if let Some(validate) = def.validator {
            validate(&value).map_err(invalid)?;
        }

        store
            .set_setting(scope, target_id, key, &value.to_string())
            .map_err(|e| SyncError::Internal {
                message: e.to_string(),
            })?;

        Ok(value)
    }
}
