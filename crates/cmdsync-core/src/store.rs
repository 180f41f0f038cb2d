//! Version store contract and an in-memory implementation
//!
//! The reconciliation engine treats the store as a blocking synchronous
//! dependency. Every method must be individually atomic; read-then-write
//! races on the same key resolve as last-write-wins.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

use crate::errors::Result;
use crate::model::{LocalVersionRecord, SettingScope, TenantVersionRecord};

/// Durable storage for command versions, tenant apply times and settings
pub trait VersionStore: Send + Sync {
    /// `None` when the command has never been recorded
    fn get_local_version(&self, command_name: &str) -> Result<Option<LocalVersionRecord>>;

    fn put_local_version(&self, command_name: &str, record: &LocalVersionRecord) -> Result<()>;

    /// Every command name ever recorded, sorted
    fn list_local_command_names(&self) -> Result<Vec<String>>;

    fn delete_local_version(&self, command_name: &str) -> Result<()>;

    fn get_tenant_last_applied(
        &self,
        tenant_id: &str,
        command_name: &str,
    ) -> Result<Option<DateTime<Utc>>>;

    fn put_tenant_last_applied(
        &self,
        tenant_id: &str,
        command_name: &str,
        applied_at: DateTime<Utc>,
    ) -> Result<()>;

    fn delete_tenant_version(&self, tenant_id: &str, command_name: &str) -> Result<()>;

    /// All records for one tenant, sorted by command name
    fn list_tenant_versions(&self, tenant_id: &str) -> Result<Vec<TenantVersionRecord>>;

    fn get_setting(&self, scope: SettingScope, target_id: &str, key: &str)
        -> Result<Option<String>>;

    fn set_setting(&self, scope: SettingScope, target_id: &str, key: &str, value: &str)
        -> Result<()>;

    /// Every local record, sorted by command name
    fn list_local_versions(&self) -> Result<Vec<(String, LocalVersionRecord)>> {
        let mut out = Vec::new();
        for name in self.list_local_command_names()? {
            if let Some(record) = self.get_local_version(&name)? {
                out.push((name, record));
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Default)]
struct MemoryTables {
    local: BTreeMap<String, LocalVersionRecord>,
    tenant: BTreeMap<(String, String), DateTime<Utc>>,
    settings: HashMap<(SettingScope, String, String), String>,
}

/// HashMap-backed store for tests and ephemeral deployments
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    tables: Mutex<MemoryTables>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VersionStore for MemoryVersionStore {
    fn get_local_version(&self, command_name: &str) -> Result<Option<LocalVersionRecord>> {
        Ok(self.tables.lock().local.get(command_name).cloned())
    }

    fn put_local_version(&self, command_name: &str, record: &LocalVersionRecord) -> Result<()> {
        self.tables
            .lock()
            .local
            .insert(command_name.to_string(), record.clone());
        Ok(())
    }

    fn list_local_command_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.lock().local.keys().cloned().collect())
    }

    fn delete_local_version(&self, command_name: &str) -> Result<()> {
        self.tables.lock().local.remove(command_name);
        Ok(())
    }

    fn get_tenant_last_applied(
        &self,
        tenant_id: &str,
        command_name: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .tables
            .lock()
            .tenant
            .get(&(tenant_id.to_string(), command_name.to_string()))
            .copied())
    }

    fn put_tenant_last_applied(
        &self,
        tenant_id: &str,
        command_name: &str,
        applied_at: DateTime<Utc>,
    ) -> Result<()> {
        self.tables
            .lock()
            .tenant
            .insert((tenant_id.to_string(), command_name.to_string()), applied_at);
        Ok(())
    }

    fn delete_tenant_version(&self, tenant_id: &str, command_name: &str) -> Result<()> {
        self.tables
            .lock()
            .tenant
            .remove(&(tenant_id.to_string(), command_name.to_string()));
        Ok(())
    }

    fn list_tenant_versions(&self, tenant_id: &str) -> Result<Vec<TenantVersionRecord>> {
        Ok(self
            .tables
            .lock()
            .tenant
            .iter()
            .filter(|((t, _), _)| t == tenant_id)
            .map(|((t, c), at)| TenantVersionRecord {
                tenant_id: t.clone(),
                command_name: c.clone(),
                last_applied_time: *at,
            })
            .collect())
    }

    fn get_setting(
        &self,
        scope: SettingScope,
        target_id: &str,
        key: &str,
    ) -> Result<Option<String>> {
        Ok(self
            .tables
            .lock()
            .settings
            .get(&(scope, target_id.to_string(), key.to_string()))
            .cloned())
    }

    fn set_setting(
        &self,
        scope: SettingScope,
        target_id: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.tables.lock().settings.insert(
            (scope, target_id.to_string(), key.to_string()),
            value.to_string(),
        );
        Ok(())
    }
}
