//! Binary configuration
//!
//! Sources, later wins: built-in defaults, `cmdsync.toml` (or `--config`),
//! then `CMDSYNC_*` environment variables. `.env` is loaded first so it can
//! feed the environment layer. `DISCORD_TOKEN` is honoured as a fallback for
//! the token.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use cmdsync_core::errors::{ExError, ExErrorKind};
use cmdsync_core::logging_facility::Profile;
use cmdsync_core::types::Sensitive;
use cmdsync_engine::SyncConfig;

pub const DEFAULT_CONFIG_FILE: &str = "cmdsync.toml";
pub const DEFAULT_API_BASE_URL: &str = "https://discord.com/api/v10";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Bot token; only needed by subcommands that talk to the platform
    pub discord_token: Option<Sensitive<String>>,
    /// Resolved from the token when absent
    pub application_id: Option<String>,
    pub api_base_url: String,
    pub database_path: String,
    pub log_level: String,
    /// `pretty` or `json`
    pub log_format: String,
    pub http_timeout_secs: u64,
    pub sync: SyncConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            discord_token: None,
            application_id: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            database_path: "database.db".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            http_timeout_secs: 30,
            sync: SyncConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load and validate configuration
    ///
    /// # Errors
    ///
    /// `Config` if a source cannot be read or a value has the wrong type.
    pub fn load(path: Option<&str>) -> Result<Self, ExError> {
        let _ = dotenvy::dotenv();

        let mut builder = Config::builder();
        let file = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if file.exists() {
            builder = builder.add_source(File::from(file));
        } else if path.is_some() {
            return Err(config_error(format!(
                "config file {} not found",
                file.display()
            )));
        }
        builder = builder.add_source(
            Environment::with_prefix("CMDSYNC")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        );

        let mut merged: AppConfig = builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| config_error(e.to_string()))?;

        if merged.discord_token.is_none() {
            merged.discord_token = std::env::var("DISCORD_TOKEN")
                .ok()
                .filter(|t| !t.is_empty())
                .map(Sensitive::new);
        }

        merged.validate()?;
        Ok(merged)
    }

    /// # Errors
    ///
    /// `Config` for an unknown log format or a zero timeout.
    pub fn validate(&self) -> Result<(), ExError> {
        self.log_profile()?;
        if self.http_timeout_secs == 0 {
            return Err(config_error("http_timeout_secs must be positive"));
        }
        Ok(())
    }

    pub fn log_profile(&self) -> Result<Profile, ExError> {
        self.log_format.parse::<Profile>().map_err(config_error)
    }

    /// The token, or a `Config` error naming what is missing
    pub fn require_token(&self) -> Result<&Sensitive<String>, ExError> {
        self.discord_token
            .as_ref()
            .ok_or_else(|| config_error("DISCORD_TOKEN (or CMDSYNC_DISCORD_TOKEN) is required"))
    }
}

fn config_error(message: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("load_config")
        .with_message(message)
}
