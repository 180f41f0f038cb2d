//! Command registry: the desired-state source of truth
//!
//! A read-mostly map guarded by a single reader/writer lock. Entries are
//! immutable once registered, so no per-entry locking is needed; readers get
//! cloned `Arc`s and never hold the lock while a command runs.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{Command, CommandSchema, Invocation, Response};
use crate::settings::SettingsCatalog;

/// Reply used when a command fails; details stay in the logs
pub const EXECUTION_ERROR_MESSAGE: &str = "An error occurred while executing the command.";

#[derive(Clone)]
struct Entry {
    schema: CommandSchema,
    command: Arc<dyn Command>,
}

/// Concurrency-safe catalog of registered commands keyed by lower-cased name
pub struct CommandRegistry {
    commands: RwLock<HashMap<String, Entry>>,
    settings: Arc<SettingsCatalog>,
}

impl CommandRegistry {
    /// Create an empty registry that forwards declared settings to `settings`
    pub fn new(settings: Arc<SettingsCatalog>) -> Self {
        Self {
            commands: RwLock::new(HashMap::new()),
            settings,
        }
    }

    /// Insert or replace a command
    ///
    /// The last registration for a name wins. Settings declared by the
    /// command are registered into the settings catalog.
    pub fn register(&self, command: Arc<dyn Command>) {
        let schema = command.schema();
        let key = schema.name.to_lowercase();

        for setting in command.settings() {
            self.settings.register(setting);
        }

        let replaced = self
            .commands
            .write()
            .insert(key.clone(), Entry { schema, command })
            .is_some();

        tracing::info!(name = %key, replaced, "Registered command");
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands
            .read()
            .get(&name.to_lowercase())
            .map(|e| e.command.clone())
    }

    /// Snapshot of every registered command, ordered by name
    pub fn all(&self) -> Vec<Arc<dyn Command>> {
        self.sorted_entries().into_iter().map(|e| e.command).collect()
    }

    /// Schema of every registered command, ordered by name
    pub fn definitions(&self) -> Vec<CommandSchema> {
        self.sorted_entries().into_iter().map(|e| e.schema).collect()
    }

    /// Registered (lower-cased) names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.commands.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.read().is_empty()
    }

    pub fn settings(&self) -> &Arc<SettingsCatalog> {
        &self.settings
    }

    /// Dispatch a slash-command invocation
    ///
    /// Returns `None` for unknown commands. A failing command is logged and
    /// answered with an ephemeral generic error instead of propagating.
    pub fn handle_invocation(&self, invocation: &Invocation) -> Option<Response> {
        let name = invocation.command_name.to_lowercase();
        let Some(command) = self.get(&name) else {
            tracing::warn!(command = %name, "Unknown command received");
            return None;
        };

        match command.execute(invocation) {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::error!(
                    command = %name,
                    tenant_id = invocation.tenant_id.as_deref().unwrap_or(""),
                    err.code = e.code(),
                    error = %e,
                    "Error executing command"
                );
                Some(Response::ephemeral(EXECUTION_ERROR_MESSAGE))
            }
        }
    }

    fn sorted_entries(&self) -> Vec<Entry> {
        let guard = self.commands.read();
        let mut entries: Vec<(&String, &Entry)> = guard.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, e)| e.clone()).collect()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}
