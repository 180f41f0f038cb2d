//! Prefix-keyed routing of component interactions and modal submissions

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::errors::{ExError, Result};

/// A component click/select or a modal submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub custom_id: String,
    pub tenant_id: Option<String>,
    pub user_id: String,
    /// The member's permission bits in the tenant; 0 outside a tenant
    #[serde(default)]
    pub permissions: u64,
    /// Selected values (components) or submitted text inputs (modals)
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl InteractionEvent {
    pub fn new(custom_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            custom_id: custom_id.into(),
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn in_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_permissions(mut self, permissions: u64) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

/// Tagged callback event as delivered by the transport layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Interaction {
    Component(InteractionEvent),
    Modal(InteractionEvent),
}

pub type InteractionHandler = Arc<dyn Fn(&InteractionEvent) -> Result<()> + Send + Sync>;

/// What happened to a dispatched event
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Handled { prefix: String },
    HandlerFailed { prefix: String, error: ExError },
    Unmatched,
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled { .. })
    }

    /// Prefix of the handler that ran, if any
    pub fn prefix(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Handled { prefix } | DispatchOutcome::HandlerFailed { prefix, .. } => {
                Some(prefix)
            }
            DispatchOutcome::Unmatched => None,
        }
    }
}

#[derive(Default)]
struct PrefixTable {
    handlers: RwLock<HashMap<String, InteractionHandler>>,
}

impl PrefixTable {
    fn insert(&self, prefix: String, handler: InteractionHandler) -> bool {
        self.handlers.write().insert(prefix, handler).is_some()
    }

    /// Longest registered prefix of `custom_id`
    fn resolve(&self, custom_id: &str) -> Option<(String, InteractionHandler)> {
        self.handlers
            .read()
            .iter()
            .filter(|(prefix, _)| custom_id.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(prefix, handler)| (prefix.clone(), handler.clone()))
    }

    fn len(&self) -> usize {
        self.handlers.read().len()
    }
}

/// Two independent prefix tables, one per interaction kind
///
/// When several prefixes match a custom id, the longest one wins, so
/// `"game_"` and `"game_over_"` can coexist. Handlers run outside the lock.
#[derive(Default)]
pub struct InteractionRouter {
    components: PrefixTable,
    modals: PrefixTable,
}

impl InteractionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component handler; an identical prefix is replaced
    pub fn register_component<F>(&self, prefix: impl Into<String>, handler: F)
    where
        F: Fn(&InteractionEvent) -> Result<()> + Send + Sync + 'static,
    {
        let prefix = prefix.into();
        let replaced = self.components.insert(prefix.clone(), Arc::new(handler));
        tracing::debug!(prefix = %prefix, replaced, "Registered component handler");
    }

    /// Register a modal handler; an identical prefix is replaced
    pub fn register_modal<F>(&self, prefix: impl Into<String>, handler: F)
    where
        F: Fn(&InteractionEvent) -> Result<()> + Send + Sync + 'static,
    {
        let prefix = prefix.into();
        let replaced = self.modals.insert(prefix.clone(), Arc::new(handler));
        tracing::debug!(prefix = %prefix, replaced, "Registered modal handler");
    }

    pub fn dispatch_component(&self, event: &InteractionEvent) -> DispatchOutcome {
        dispatch(&self.components, "component", event)
    }

    pub fn dispatch_modal(&self, event: &InteractionEvent) -> DispatchOutcome {
        dispatch(&self.modals, "modal", event)
    }

    /// Dispatch a tagged interaction to the matching table
    pub fn route(&self, interaction: &Interaction) -> DispatchOutcome {
        match interaction {
            Interaction::Component(event) => self.dispatch_component(event),
            Interaction::Modal(event) => self.dispatch_modal(event),
        }
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn modal_count(&self) -> usize {
        self.modals.len()
    }
}

fn dispatch(table: &PrefixTable, kind: &str, event: &InteractionEvent) -> DispatchOutcome {
    let Some((prefix, handler)) = table.resolve(&event.custom_id) else {
        tracing::warn!(kind, custom_id = %event.custom_id, "No handler found for interaction");
        return DispatchOutcome::Unmatched;
    };

    match handler(event) {
        Ok(()) => DispatchOutcome::Handled { prefix },
        Err(error) => {
            tracing::error!(
                kind,
                custom_id = %event.custom_id,
                prefix = %prefix,
                err.code = error.code(),
                error = %error,
                "Interaction handler failed"
            );
            DispatchOutcome::HandlerFailed { prefix, error }
        }
    }
}

impl std::fmt::Debug for InteractionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionRouter")
            .field("components", &self.component_count())
            .field("modals", &self.modal_count())
            .finish()
    }
}
