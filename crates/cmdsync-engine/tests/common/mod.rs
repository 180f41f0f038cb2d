#![allow(dead_code, clippy::unwrap_used)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use cmdsync_core::clock::ManualClock;
use cmdsync_core::errors::{ExError, ExErrorKind, Result};
use cmdsync_core::model::{
    Command, CommandSchema, Invocation, LocalVersionRecord, RemoteCommand, Response, SettingScope,
    TenantVersionRecord,
};
use cmdsync_core::registry::CommandRegistry;
use cmdsync_core::remote::RemoteCommandApi;
use cmdsync_core::settings::SettingsCatalog;
use cmdsync_core::store::{MemoryVersionStore, VersionStore};
use cmdsync_engine::{Reconciler, SyncConfig};

/// Command with a fixed name and version
pub struct StaticCommand {
    name: String,
    version: String,
}

impl StaticCommand {
    pub fn arc(name: &str, version: &str) -> Arc<dyn Command> {
        Arc::new(Self {
            name: name.to_string(),
            version: version.to_string(),
        })
    }
}

impl Command for StaticCommand {
    fn schema(&self) -> CommandSchema {
        CommandSchema::new(self.name.clone(), format!("{} command", self.name))
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn execute(&self, _invocation: &Invocation) -> Result<Response> {
        Ok(Response::public(self.name.clone()))
    }
}

#[derive(Default)]
struct RemoteState {
    commands: BTreeMap<String, Vec<RemoteCommand>>,
    next_id: u64,
    creates: usize,
    updates: usize,
    deletes: usize,
}

/// In-memory remote platform with failure injection
#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<RemoteState>,
    fail_list: Mutex<HashSet<String>>,
    panic_list: Mutex<HashSet<String>>,
    fail_apply: Mutex<HashSet<String>>,
    fail_delete: Mutex<HashSet<String>>,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail `list` for a tenant
    pub fn fail_list_for(&self, tenant_id: &str) {
        self.fail_list.lock().insert(tenant_id.to_string());
    }

    /// Panic inside `list` for a tenant
    pub fn panic_list_for(&self, tenant_id: &str) {
        self.panic_list.lock().insert(tenant_id.to_string());
    }

    /// Fail create and update of a command name
    pub fn fail_apply_of(&self, name: &str) {
        self.fail_apply.lock().insert(name.to_string());
    }

    pub fn fail_delete_of(&self, name: &str) {
        self.fail_delete.lock().insert(name.to_string());
    }

    pub fn heal(&self) {
        self.fail_list.lock().clear();
        self.fail_apply.lock().clear();
        self.fail_delete.lock().clear();
    }

    /// Seed a command directly, bypassing counters
    pub fn seed(&self, tenant_id: &str, name: &str) -> String {
        let mut state = self.state.lock();
        state.next_id += 1;
        let remote_id = format!("seed-{}", state.next_id);
        state
            .commands
            .entry(tenant_id.to_string())
            .or_default()
            .push(RemoteCommand {
                remote_id: remote_id.clone(),
                name: name.to_string(),
                schema: CommandSchema::new(name, "seeded"),
            });
        remote_id
    }

    pub fn names(&self, tenant_id: &str) -> Vec<String> {
        let mut names: Vec<_> = self
            .state
            .lock()
            .commands
            .get(tenant_id)
            .map(|cmds| cmds.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn schema_of(&self, tenant_id: &str, name: &str) -> Option<CommandSchema> {
        self.state
            .lock()
            .commands
            .get(tenant_id)
            .and_then(|cmds| cmds.iter().find(|c| c.name == name))
            .map(|c| c.schema.clone())
    }

    pub fn mutations(&self) -> usize {
        let state = self.state.lock();
        state.creates + state.updates + state.deletes
    }

    pub fn creates(&self) -> usize {
        self.state.lock().creates
    }

    pub fn updates(&self) -> usize {
        self.state.lock().updates
    }

    pub fn deletes(&self) -> usize {
        self.state.lock().deletes
    }

    pub fn reset_counters(&self) {
        let mut state = self.state.lock();
        state.creates = 0;
        state.updates = 0;
        state.deletes = 0;
    }

    fn apply_failure(&self, name: &str) -> Option<ExError> {
        self.fail_apply.lock().contains(name).then(|| {
            ExError::new(ExErrorKind::ExternalService)
                .with_op("remote_apply")
                .with_message(format!("HTTP 500 applying {}", name))
        })
    }
}

impl RemoteCommandApi for FakeRemote {
    fn list(&self, tenant_id: &str) -> Result<Vec<RemoteCommand>> {
        if self.panic_list.lock().contains(tenant_id) {
            panic!("remote connection torn down for {}", tenant_id);
        }
        if self.fail_list.lock().contains(tenant_id) {
            return Err(ExError::new(ExErrorKind::Forbidden).with_message("Missing Access"));
        }
        Ok(self
            .state
            .lock()
            .commands
            .get(tenant_id)
            .cloned()
            .unwrap_or_default())
    }

    fn create(&self, tenant_id: &str, schema: &CommandSchema) -> Result<String> {
        if let Some(e) = self.apply_failure(&schema.name) {
            return Err(e);
        }
        let mut state = self.state.lock();
        state.next_id += 1;
        state.creates += 1;
        let remote_id = format!("cmd-{}", state.next_id);
        state
            .commands
            .entry(tenant_id.to_string())
            .or_default()
            .push(RemoteCommand {
                remote_id: remote_id.clone(),
                name: schema.name.clone(),
                schema: schema.clone(),
            });
        Ok(remote_id)
    }

    fn update(&self, tenant_id: &str, remote_id: &str, schema: &CommandSchema) -> Result<()> {
        if let Some(e) = self.apply_failure(&schema.name) {
            return Err(e);
        }
        let mut state = self.state.lock();
        state.updates += 1;
        let existing = state
            .commands
            .get_mut(tenant_id)
            .and_then(|cmds| cmds.iter_mut().find(|c| c.remote_id == remote_id))
            .ok_or_else(|| ExError::new(ExErrorKind::NotFound).with_message("Unknown command"))?;
        existing.name = schema.name.clone();
        existing.schema = schema.clone();
        Ok(())
    }

    fn delete(&self, tenant_id: &str, remote_id: &str) -> Result<()> {
        let mut state = self.state.lock();
        let cmds = state.commands.entry(tenant_id.to_string()).or_default();
        let Some(pos) = cmds.iter().position(|c| c.remote_id == remote_id) else {
            return Err(ExError::new(ExErrorKind::NotFound).with_message("Unknown command"));
        };
        if self.fail_delete.lock().contains(&cmds[pos].name) {
            return Err(ExError::new(ExErrorKind::ExternalService).with_message("HTTP 503"));
        }
        cmds.remove(pos);
        state.deletes += 1;
        Ok(())
    }
}

/// Store wrapper whose tenant reads fail for chosen commands
pub struct FlakyStore {
    inner: MemoryVersionStore,
    fail_tenant_reads: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryVersionStore::new(),
            fail_tenant_reads: Mutex::new(HashSet::new()),
        })
    }

    pub fn fail_tenant_read_of(&self, name: &str) {
        self.fail_tenant_reads.lock().insert(name.to_string());
    }
}

impl VersionStore for FlakyStore {
    fn get_local_version(&self, command_name: &str) -> Result<Option<LocalVersionRecord>> {
        self.inner.get_local_version(command_name)
    }

    fn put_local_version(&self, command_name: &str, record: &LocalVersionRecord) -> Result<()> {
        self.inner.put_local_version(command_name, record)
    }

    fn list_local_command_names(&self) -> Result<Vec<String>> {
        self.inner.list_local_command_names()
    }

    fn delete_local_version(&self, command_name: &str) -> Result<()> {
        self.inner.delete_local_version(command_name)
    }

    fn get_tenant_last_applied(
        &self,
        tenant_id: &str,
        command_name: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        if self.fail_tenant_reads.lock().contains(command_name) {
            return Err(ExError::new(ExErrorKind::Persistence).with_message("disk I/O error"));
        }
        self.inner.get_tenant_last_applied(tenant_id, command_name)
    }

    fn put_tenant_last_applied(
        &self,
        tenant_id: &str,
        command_name: &str,
        applied_at: DateTime<Utc>,
    ) -> Result<()> {
        self.inner
            .put_tenant_last_applied(tenant_id, command_name, applied_at)
    }

    fn delete_tenant_version(&self, tenant_id: &str, command_name: &str) -> Result<()> {
        self.inner.delete_tenant_version(tenant_id, command_name)
    }

    fn list_tenant_versions(&self, tenant_id: &str) -> Result<Vec<TenantVersionRecord>> {
        self.inner.list_tenant_versions(tenant_id)
    }

    fn get_setting(
        &self,
        scope: SettingScope,
        target_id: &str,
        key: &str,
    ) -> Result<Option<String>> {
        self.inner.get_setting(scope, target_id, key)
    }

    fn set_setting(
        &self,
        scope: SettingScope,
        target_id: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.inner.set_setting(scope, target_id, key, value)
    }
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Everything a reconcile test needs, wired together
pub struct Harness {
    pub registry: Arc<CommandRegistry>,
    pub store: Arc<dyn VersionStore>,
    pub remote: Arc<FakeRemote>,
    pub clock: Arc<ManualClock>,
    pub reconciler: Arc<Reconciler>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryVersionStore::new()))
    }

    pub fn with_store(store: Arc<dyn VersionStore>) -> Self {
        let registry = Arc::new(CommandRegistry::new(Arc::new(SettingsCatalog::new())));
        let remote = FakeRemote::new();
        let clock = Arc::new(ManualClock::new(epoch()));
        let reconciler = Arc::new(Reconciler::new(
            SyncConfig::default(),
            registry.clone(),
            store.clone(),
            remote.clone(),
            clock.clone(),
        ));
        Self {
            registry,
            store,
            remote,
            clock,
            reconciler,
        }
    }

    pub fn register(&self, name: &str, version: &str) {
        self.registry.register(StaticCommand::arc(name, version));
    }

    pub fn tick(&self) {
        self.clock.advance(Duration::seconds(1));
    }
}
