//! Built-in commands shipped with the binary

use serde_json::json;
use std::sync::{Arc, Weak};

use cmdsync_core::errors::{ExError, ExErrorKind, Result, SyncError};
use cmdsync_core::model::{
    Command, CommandSchema, Invocation, Response, SettingDefinition, SettingKind, SettingScope,
    SettingValue,
};
use cmdsync_core::registry::CommandRegistry;
use cmdsync_core::router::{InteractionEvent, InteractionRouter};
use cmdsync_core::settings::SettingsCatalog;
use cmdsync_core::store::VersionStore;
use cmdsync_engine::{ReloadCommand, Reconciler};

/// Application option type for a string argument
const OPTION_STRING: u8 = 3;

/// Custom id prefix of the per-setting select menu; the key follows
pub const SETTING_SELECT_PREFIX: &str = "setting_select:";
/// Custom id prefix of the per-setting text modal; the key follows
pub const SETTING_MODAL_PREFIX: &str = "setting_modal:";
/// Field holding the chosen or typed value in a settings interaction
pub const SETTING_VALUE_FIELD: &str = "value";

pub struct PingCommand;

impl Command for PingCommand {
    fn schema(&self) -> CommandSchema {
        CommandSchema::new("ping", "Check if the bot is responsive")
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn execute(&self, _invocation: &Invocation) -> Result<Response> {
        Ok(Response::ephemeral("Pong!"))
    }
}

/// Lists every registered command
///
/// Holds the registry weakly since the registry owns this command.
pub struct HelpCommand {
    registry: Weak<CommandRegistry>,
}

impl HelpCommand {
    pub fn new(registry: &Arc<CommandRegistry>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
        }
    }
}

impl Command for HelpCommand {
    fn schema(&self) -> CommandSchema {
        CommandSchema::new("help", "Display all available commands")
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn execute(&self, _invocation: &Invocation) -> Result<Response> {
        let registry = self.registry.upgrade().ok_or_else(|| {
            ExError::new(ExErrorKind::Internal)
                .with_op("help")
                .with_message("registry has been dropped")
        })?;

        let mut content = String::from("Available commands:\n");
        for schema in registry.definitions() {
            content.push_str(&format!("`/{}` - {}\n", schema.name, schema.description));
        }
        Ok(Response::ephemeral(content))
    }
}

/// Reads and writes declared settings
pub struct SettingsCommand {
    settings: Arc<SettingsCatalog>,
    store: Arc<dyn VersionStore>,
}

impl SettingsCommand {
    pub fn new(settings: Arc<SettingsCatalog>, store: Arc<dyn VersionStore>) -> Self {
        Self { settings, store }
    }

    fn target<'a>(
        &self,
        scope: SettingScope,
        invocation: &'a Invocation,
    ) -> std::result::Result<&'a str, SyncError> {
        match scope {
            SettingScope::User => Ok(&invocation.user_id),
            SettingScope::Tenant => {
                invocation
                    .tenant_id
                    .as_deref()
                    .ok_or_else(|| SyncError::TenantRequired {
                        command_name: "settings".to_string(),
                    })
            }
        }
    }

    fn list(&self, invocation: &Invocation) -> Result<Response> {
        let mut content = String::from("Settings:\n");
        for def in self.settings.definitions() {
            if !def.permits(invocation.permissions) {
                continue;
            }
            let value = match self.target(def.scope, invocation) {
                Ok(target) => self
                    .settings
                    .get_value(self.store.as_ref(), def.scope, target, &def.key)?
                    .to_string(),
                Err(_) => "(server only)".to_string(),
            };
            content.push_str(&format!(
                "`{}` [{}/{}] = {}\n",
                def.key,
                def.module,
                def.scope.as_str(),
                value
            ));
        }
        Ok(Response::ephemeral(content))
    }
}

impl Command for SettingsCommand {
    fn schema(&self) -> CommandSchema {
        CommandSchema::new("settings", "View or change settings")
            .with_option(json!({
                "type": OPTION_STRING,
                "name": "key",
                "description": "Setting to view or change",
                "required": false
            }))
            .with_option(json!({
                "type": OPTION_STRING,
                "name": "value",
                "description": "New value",
                "required": false
            }))
    }

    fn version(&self) -> &str {
        "1.1.0"
    }

    fn execute(&self, invocation: &Invocation) -> Result<Response> {
        let Some(key) = invocation.option_str("key") else {
            return self.list(invocation);
        };
        let def = self
            .settings
            .get(key)
            .ok_or_else(|| SyncError::UnknownSetting {
                key: key.to_string(),
            })?;
        if !def.permits(invocation.permissions) {
            return Err(SyncError::PermissionDenied {
                key: key.to_string(),
            }
            .into());
        }
        let target = self.target(def.scope, invocation)?;

        match invocation.option_str("value") {
            Some(raw) => {
                match self
                    .settings
                    .set_value(self.store.as_ref(), def.scope, target, key, raw)
                {
                    Ok(value) => Ok(Response::ephemeral(format!("`{}` set to {}", key, value))),
                    Err(SyncError::InvalidSettingValue { reason, .. }) => {
                        Ok(Response::ephemeral(format!("Invalid value: {}", reason)))
                    }
                    Err(e) => Err(e.into()),
                }
            }
            None => {
                let value = self
                    .settings
                    .get_value(self.store.as_ref(), def.scope, target, key)?;
                Ok(Response::ephemeral(format!("`{}` = {}", key, value)))
            }
        }
    }
}

/// Settings owned by the binary rather than by any one command
pub fn general_settings() -> Vec<SettingDefinition> {
    vec![SettingDefinition::new(
        "language",
        "general",
        SettingScope::User,
        SettingKind::Select(vec![
            "auto".to_string(),
            "zh-TW".to_string(),
            "en-US".to_string(),
        ]),
        SettingValue::Text("auto".to_string()),
    )]
}

/// Apply a value chosen in a settings select menu or typed into its modal
fn apply_setting_interaction(
    settings: &SettingsCatalog,
    store: &dyn VersionStore,
    prefix: &str,
    event: &InteractionEvent,
) -> Result<()> {
    let key = event.custom_id.strip_prefix(prefix).unwrap_or_default();
    let def = settings.get(key).ok_or_else(|| SyncError::UnknownSetting {
        key: key.to_string(),
    })?;
    if !def.permits(event.permissions) {
        return Err(SyncError::PermissionDenied {
            key: key.to_string(),
        }
        .into());
    }

    let target = match def.scope {
        SettingScope::User => event.user_id.as_str(),
        SettingScope::Tenant => {
            event
                .tenant_id
                .as_deref()
                .ok_or_else(|| SyncError::TenantRequired {
                    command_name: "settings".to_string(),
                })?
        }
    };
    let raw = event.values.get(SETTING_VALUE_FIELD).ok_or_else(|| {
        ExError::new(ExErrorKind::InvalidInput)
            .with_op("apply_setting")
            .with_message(format!("no value submitted for {}", key))
    })?;

    let value = settings.set_value(store, def.scope, target, key, raw)?;
    tracing::info!(key, target, value = %value, "Setting changed");
    Ok(())
}

fn setting_handler(
    prefix: &'static str,
    settings: Arc<SettingsCatalog>,
    store: Arc<dyn VersionStore>,
) -> impl Fn(&InteractionEvent) -> Result<()> + Send + Sync + 'static {
    move |event: &InteractionEvent| {
        apply_setting_interaction(&settings, store.as_ref(), prefix, event)
    }
}

/// Route settings select menus and modals to the catalog
pub fn register_settings_interactions(
    router: &InteractionRouter,
    settings: Arc<SettingsCatalog>,
    store: Arc<dyn VersionStore>,
) {
    router.register_component(
        SETTING_SELECT_PREFIX,
        setting_handler(SETTING_SELECT_PREFIX, settings.clone(), store.clone()),
    );
    router.register_modal(
        SETTING_MODAL_PREFIX,
        setting_handler(SETTING_MODAL_PREFIX, settings, store),
    );
}

/// Register everything except `reload`, which needs the reconciler
pub fn register_builtin(registry: &Arc<CommandRegistry>, store: Arc<dyn VersionStore>) {
    for def in general_settings() {
        registry.settings().register(def);
    }
    registry.register(Arc::new(PingCommand));
    registry.register(Arc::new(HelpCommand::new(registry)));
    registry.register(Arc::new(SettingsCommand::new(
        registry.settings().clone(),
        store,
    )));
}

pub fn register_reload(reconciler: &Arc<Reconciler>) {
    reconciler
        .registry()
        .register(Arc::new(ReloadCommand::new(reconciler)));
}
