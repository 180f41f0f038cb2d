//! Command definitions and invocation types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::Result;
use crate::model::setting::SettingDefinition;

/// Application command type for slash commands
pub const CHAT_INPUT: u8 = 1;

fn chat_input() -> u8 {
    CHAT_INPUT
}

/// The shape of a command as the remote platform sees it
///
/// Reconciliation treats this as an opaque comparable blob: it is sent
/// verbatim on create/update and never interpreted beyond `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default = "chat_input")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,
}

impl CommandSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: CHAT_INPUT,
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, option: Value) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_kind(mut self, kind: u8) -> Self {
        self.kind = kind;
        self
    }
}

/// A registrable command: schema, semantic version and behavior
///
/// Implementations are immutable once registered; re-registering under the
/// same name replaces the entry.
pub trait Command: Send + Sync {
    fn schema(&self) -> CommandSchema;

    /// Semantic version without prefix, e.g. `"1.2.0"`
    fn version(&self) -> &str;

    /// Settings this command declares; registered alongside the command
    fn settings(&self) -> Vec<SettingDefinition> {
        Vec::new()
    }

    /// Run the command for one invocation
    ///
    /// # Errors
    ///
    /// Any `ExError`; the registry logs it and answers with a generic
    /// ephemeral error message.
    fn execute(&self, invocation: &Invocation) -> Result<Response>;
}

/// One slash-command invocation as delivered by the transport layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub command_name: String,
    pub tenant_id: Option<String>,
    pub user_id: String,
    pub locale: Option<String>,
    /// The member's permission bits in the tenant; 0 outside a tenant
    #[serde(default)]
    pub permissions: u64,
    pub options: BTreeMap<String, Value>,
}

impl Invocation {
    pub fn new(command_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            command_name: command_name.into(),
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

    pub fn with_option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    /// String value of an option, if present and a string
    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.options.get(name).and_then(Value::as_str)
    }
}

/// Reply sent back for an invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub content: String,
    /// Only visible to the invoking user
    pub ephemeral: bool,
}

impl Response {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}
