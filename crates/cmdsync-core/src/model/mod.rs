//! Domain model for command synchronisation

pub mod command;
pub mod setting;
pub mod version;

pub use command::{Command, CommandSchema, Invocation, Response, CHAT_INPUT};
pub use setting::{SettingDefinition, SettingKind, SettingScope, SettingValue, ADMINISTRATOR};
pub use version::{
    is_version_newer, parse_version, LocalVersionRecord, RemoteCommand, TenantVersionRecord,
};
