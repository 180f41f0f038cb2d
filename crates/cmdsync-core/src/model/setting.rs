//! Declarative settings that commands expose to tenants and users

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who a setting value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingScope {
    Tenant,
    User,
}

impl SettingScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingScope::Tenant => "tenant",
            SettingScope::User => "user",
        }
    }
}

impl std::str::FromStr for SettingScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tenant" | "guild" => Ok(SettingScope::Tenant),
            "user" => Ok(SettingScope::User),
            other => Err(format!("unknown setting scope '{}'", other)),
        }
    }
}

/// Value type of a setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    String,
    Int,
    Bool,
    /// One of a fixed list of options
    Select(Vec<String>),
    /// A channel id
    Channel,
}

/// A typed setting value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl SettingValue {
    /// Parse a stored or user-supplied string according to `kind`
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the string does not fit `kind`.
    pub fn parse(kind: &SettingKind, raw: &str) -> Result<Self, String> {
        match kind {
            SettingKind::Int => raw
                .trim()
                .parse::<i64>()
                .map(SettingValue::Int)
                .map_err(|_| format!("'{}' is not an integer", raw)),
            SettingKind::Bool => match raw.trim() {
                "true" => Ok(SettingValue::Bool(true)),
                "false" => Ok(SettingValue::Bool(false)),
                other => Err(format!("'{}' is not a boolean", other)),
            },
            SettingKind::Select(options) => {
                if options.iter().any(|o| o == raw) {
                    Ok(SettingValue::Text(raw.to_string()))
                } else {
                    Err(format!(
                        "'{}' is not one of [{}]",
                        raw,
                        options.join(", ")
                    ))
                }
            }
            SettingKind::String | SettingKind::Channel => Ok(SettingValue::Text(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{}", b),
            SettingValue::Int(i) => write!(f, "{}", i),
            SettingValue::Text(s) => f.write_str(s),
        }
    }
}

/// Platform permission bit for server administrators
pub const ADMINISTRATOR: u64 = 0x8;

/// Extra validation run after type parsing
pub type SettingValidator = fn(&SettingValue) -> Result<(), String>;

/// Declaration of a single setting
#[derive(Debug, Clone)]
pub struct SettingDefinition {
    pub key: String,
    /// Owning feature, used to group settings in listings
    pub module: String,
    pub scope: SettingScope,
    pub kind: SettingKind,
    pub default: SettingValue,
    pub validator: Option<SettingValidator>,
    /// Permission bits a member needs to see or change a tenant-scoped value
    ///
    /// Defaults to `ADMINISTRATOR` for tenant scope and to none for user scope.
    pub required_permission: u64,
}

impl SettingDefinition {
    pub fn new(
        key: impl Into<String>,
        module: impl Into<String>,
        scope: SettingScope,
        kind: SettingKind,
        default: SettingValue,
    ) -> Self {
        let required_permission = match scope {
            SettingScope::Tenant => ADMINISTRATOR,
            SettingScope::User => 0,
        };
        Self {
            key: key.into(),
            module: module.into(),
            scope,
            kind,
            default,
            validator: None,
            required_permission,
        }
    }

    pub fn with_validator(mut self, validator: SettingValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_required_permission(mut self, bits: u64) -> Self {
        self.required_permission = bits;
        self
    }

    /// Whether a member holding `permissions` may see and change this setting
    ///
    /// User-scoped settings always belong to the invoking user.
    pub fn permits(&self, permissions: u64) -> bool {
        match self.scope {
            SettingScope::User => true,
            SettingScope::Tenant => {
                permissions & self.required_permission == self.required_permission
            }
        }
    }
}
