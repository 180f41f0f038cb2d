use thiserror::Error;

/// Result type alias using the canonical `ExError`
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used in logs (`err.code`), in
/// tests, and in operator-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExErrorKind {
    // Definition / validation
    InvalidInput,
    NotFound,
    InvalidVersion,
    MissingLocalVersion,
    InvalidSettingValue,
    TenantRequired,

    // Reconciliation
    /// At least one command failed to sync; the rest of the pass completed
    PartialSync,

    // Integration / IO
    Io,
    Serialization,
    Persistence,
    ExternalService,
    RateLimited,
    Timeout,
    Config,

    // Auth
    Unauthorised,
    Forbidden,

    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidVersion => "ERR_INVALID_VERSION",
            ExErrorKind::MissingLocalVersion => "ERR_MISSING_LOCAL_VERSION",
            ExErrorKind::InvalidSettingValue => "ERR_INVALID_SETTING_VALUE",
            ExErrorKind::TenantRequired => "ERR_TENANT_REQUIRED",
            ExErrorKind::PartialSync => "ERR_PARTIAL_SYNC",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::RateLimited => "ERR_RATE_LIMITED",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Unauthorised => "ERR_UNAUTHORISED",
            ExErrorKind::Forbidden => "ERR_FORBIDDEN",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether a failure of this kind is worth retrying on the next trigger
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ExErrorKind::ExternalService
                | ExErrorKind::RateLimited
                | ExErrorKind::Timeout
                | ExErrorKind::Io
                | ExErrorKind::Persistence
        )
    }
}

/// Canonical structured error type
///
/// Every trait seam in the workspace (version store, remote API, command
/// execution, interaction handlers) returns this type so callers can branch
/// on `kind()` instead of parsing messages.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    tenant_id: Option<String>,
    command_name: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            tenant_id: None,
            command_name: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add tenant context
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Add command context
    pub fn with_command_name(mut self, name: impl Into<String>) -> Self {
        self.command_name = Some(name.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn command_name(&self) -> Option<&str> {
        self.command_name.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(tenant_id) = &self.tenant_id {
            write!(f, " (tenant_id: {})", tenant_id)?;
        }
        if let Some(command_name) = &self.command_name {
            write!(f, " (command: {})", command_name)?;
        }
        if let Some(source) = &self.source {
            write!(f, ", caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for registry, settings and version handling
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// No command registered under this name
    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    /// No setting declared under this key
    #[error("Setting {key} not found")]
    UnknownSetting { key: String },

    /// Value rejected by the setting's type, options or validator
    #[error("Invalid value for setting {key}: {reason}")]
    InvalidSettingValue { key: String, reason: String },

    /// Declared command version is not a semantic version
    #[error("Invalid command version: {version}")]
    InvalidVersion { version: String },

    /// Command has never been recorded in the local version table
    #[error("No local version recorded for command {command_name}")]
    MissingLocalVersion { command_name: String },

    /// Member lacks the permission bits a setting requires
    #[error("Missing permission to manage setting {key}")]
    PermissionDenied { key: String },

    /// Command can only run inside a tenant
    #[error("Command {command_name} can only be used inside a guild")]
    TenantRequired { command_name: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<SyncError> for ExError {
    fn from(err: SyncError) -> Self {
        let message = err.to_string();
        match err {
            SyncError::UnknownCommand { name } => ExError::new(ExErrorKind::NotFound)
                .with_command_name(name)
                .with_message(message),
            SyncError::UnknownSetting { .. } => {
                ExError::new(ExErrorKind::NotFound).with_message(message)
            }
            SyncError::InvalidSettingValue { .. } => {
                ExError::new(ExErrorKind::InvalidSettingValue).with_message(message)
            }
            SyncError::InvalidVersion { .. } => {
                ExError::new(ExErrorKind::InvalidVersion).with_message(message)
            }
            SyncError::MissingLocalVersion { command_name } => {
                ExError::new(ExErrorKind::MissingLocalVersion)
                    .with_command_name(command_name)
                    .with_message(message)
            }
            SyncError::PermissionDenied { .. } => {
                ExError::new(ExErrorKind::Forbidden).with_message(message)
            }
            SyncError::TenantRequired { command_name } => {
                ExError::new(ExErrorKind::TenantRequired)
                    .with_command_name(command_name)
                    .with_message(message)
            }
            SyncError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
            SyncError::Internal { .. } => ExError::new(ExErrorKind::Internal).with_message(message),
        }
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}
