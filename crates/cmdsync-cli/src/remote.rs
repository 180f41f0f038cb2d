//! HTTP implementation of the remote command API

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;

use cmdsync_core::errors::{ExError, ExErrorKind, Result};
use cmdsync_core::model::{CommandSchema, RemoteCommand, CHAT_INPUT};
use cmdsync_core::remote::RemoteCommandApi;
use cmdsync_core::types::Sensitive;

use crate::config::AppConfig;

pub fn commands_url(base: &str, application_id: &str, tenant_id: &str) -> String {
    format!(
        "{}/applications/{}/guilds/{}/commands",
        base.trim_end_matches('/'),
        application_id,
        tenant_id
    )
}

pub fn command_url(base: &str, application_id: &str, tenant_id: &str, remote_id: &str) -> String {
    format!("{}/{}", commands_url(base, application_id, tenant_id), remote_id)
}

pub fn current_application_url(base: &str) -> String {
    format!("{}/oauth2/applications/@me", base.trim_end_matches('/'))
}

fn chat_input() -> u8 {
    CHAT_INPUT
}

/// Command object as returned by the platform
#[derive(Debug, Deserialize)]
struct ApiCommand {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type", default = "chat_input")]
    kind: u8,
    #[serde(default)]
    options: Vec<Value>,
}

impl From<ApiCommand> for RemoteCommand {
    fn from(cmd: ApiCommand) -> Self {
        RemoteCommand {
            remote_id: cmd.id,
            schema: CommandSchema {
                name: cmd.name.clone(),
                description: cmd.description,
                kind: cmd.kind,
                options: cmd.options,
            },
            name: cmd.name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiApplication {
    id: String,
}

/// Map a non-success status to an error kind
pub fn status_error(status: StatusCode, body: &str, op: &str) -> ExError {
    let kind = match status {
        StatusCode::UNAUTHORIZED => ExErrorKind::Unauthorised,
        StatusCode::FORBIDDEN => ExErrorKind::Forbidden,
        StatusCode::NOT_FOUND => ExErrorKind::NotFound,
        StatusCode::TOO_MANY_REQUESTS => ExErrorKind::RateLimited,
        StatusCode::BAD_REQUEST => ExErrorKind::InvalidInput,
        _ => ExErrorKind::ExternalService,
    };
    let body: String = body.chars().take(200).collect();
    ExError::new(kind)
        .with_op(op)
        .with_message(format!("HTTP {}: {}", status.as_u16(), body))
}

fn transport_error(err: reqwest::Error, op: &str) -> ExError {
    let kind = if err.is_timeout() {
        ExErrorKind::Timeout
    } else {
        ExErrorKind::ExternalService
    };
    ExError::new(kind).with_op(op).with_message(err.to_string())
}

/// Blocking client for the per-tenant command endpoints
pub struct HttpCommandApi {
    client: Client,
    base_url: String,
    token: Sensitive<String>,
    application_id: OnceLock<String>,
}

impl HttpCommandApi {
    /// # Errors
    ///
    /// `Config` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        token: Sensitive<String>,
        application_id: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cmdsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ExError::new(ExErrorKind::Config)
                    .with_op("http_client")
                    .with_message(e.to_string())
            })?;

        let cell = OnceLock::new();
        if let Some(id) = application_id {
            let _ = cell.set(id);
        }

        Ok(Self {
            client,
            base_url: base_url.into(),
            token,
            application_id: cell,
        })
    }

    /// # Errors
    ///
    /// `Config` when no token is configured.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.api_base_url.clone(),
            config.require_token()?.clone(),
            config.application_id.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("Bot {}", self.token.expose()))
    }

    fn send(&self, request: RequestBuilder, op: &str) -> Result<Response> {
        let response = self
            .authorized(request)
            .send()
            .map_err(|e| transport_error(e, op))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(status_error(status, &body, op))
    }

    fn application_id(&self) -> Result<&str> {
        if let Some(id) = self.application_id.get() {
            return Ok(id);
        }

        let op = "resolve_application_id";
        let app: ApiApplication = self
            .send(self.client.get(current_application_url(&self.base_url)), op)?
            .json()
            .map_err(|e| transport_error(e, op))?;
        tracing::debug!(application_id = %app.id, "Resolved application id");

        let _ = self.application_id.set(app.id);
        self.application_id.get().map(String::as_str).ok_or_else(|| {
            ExError::new(ExErrorKind::Internal)
                .with_op(op)
                .with_message("application id unavailable")
        })
    }
}

impl RemoteCommandApi for HttpCommandApi {
    fn list(&self, tenant_id: &str) -> Result<Vec<RemoteCommand>> {
        let op = "remote_list";
        let url = commands_url(&self.base_url, self.application_id()?, tenant_id);
        let commands: Vec<ApiCommand> = self
            .send(self.client.get(url), op)?
            .json()
            .map_err(|e| transport_error(e, op))?;
        Ok(commands.into_iter().map(RemoteCommand::from).collect())
    }

    fn create(&self, tenant_id: &str, schema: &CommandSchema) -> Result<String> {
        let op = "remote_create";
        let url = commands_url(&self.base_url, self.application_id()?, tenant_id);
        let created: ApiCommand = self
            .send(self.client.post(url).json(schema), op)?
            .json()
            .map_err(|e| transport_error(e, op))?;
        Ok(created.id)
    }

    fn update(&self, tenant_id: &str, remote_id: &str, schema: &CommandSchema) -> Result<()> {
        let url = command_url(&self.base_url, self.application_id()?, tenant_id, remote_id);
        self.send(self.client.patch(url).json(schema), "remote_update")?;
        Ok(())
    }

    fn delete(&self, tenant_id: &str, remote_id: &str) -> Result<()> {
        let url = command_url(&self.base_url, self.application_id()?, tenant_id, remote_id);
        self.send(self.client.delete(url), "remote_delete")?;
        Ok(())
    }
}

/// Stand-in for subcommands that never reach the platform
#[derive(Debug, Default)]
pub struct OfflineRemote;

impl OfflineRemote {
    fn unavailable(op: &str) -> ExError {
        ExError::new(ExErrorKind::Config)
            .with_op(op)
            .with_message("remote API not configured for this subcommand")
    }
}

impl RemoteCommandApi for OfflineRemote {
    fn list(&self, _tenant_id: &str) -> Result<Vec<RemoteCommand>> {
        Err(Self::unavailable("remote_list"))
    }

    fn create(&self, _tenant_id: &str, _schema: &CommandSchema) -> Result<String> {
        Err(Self::unavailable("remote_create"))
    }

    fn update(&self, _tenant_id: &str, _remote_id: &str, _schema: &CommandSchema) -> Result<()> {
        Err(Self::unavailable("remote_update"))
    }

    fn delete(&self, _tenant_id: &str, _remote_id: &str) -> Result<()> {
        Err(Self::unavailable("remote_delete"))
    }
}
