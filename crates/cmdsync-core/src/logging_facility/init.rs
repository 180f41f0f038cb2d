//! Logging initialization

use std::str::FromStr;
use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output, `cmdsync=debug` unless overridden
    Development,
    /// JSON structured output, `cmdsync=info` unless overridden
    Production,
    /// No output; tests install the capture layer instead
    Test,
}

impl Profile {
    fn default_filter(&self) -> &'static str {
        match self {
            Profile::Development => "cmdsync=debug",
            Profile::Production => "cmdsync=info",
            Profile::Test => "off",
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(Profile::Development),
            "json" | "prod" | "production" => Ok(Profile::Production),
            "test" => Ok(Profile::Test),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility with the profile's default filter
///
/// Call once at startup. Subsequent calls are no-ops, as is a call made
/// after another global subscriber was installed. `RUST_LOG` always takes
/// precedence over the profile default.
pub fn init(profile: Profile) {
    init_with_filter(profile, None);
}

/// Initialize the logging facility with an explicit filter directive
///
/// `filter` accepts anything `EnvFilter` understands, including a bare level
/// such as `"warn"`. A bare level is scoped to the `cmdsync` targets.
pub fn init_with_filter(profile: Profile, filter: Option<&str>) {
    INIT_ONCE.call_once(|| {
        let directive = match filter {
            Some(level) if !level.contains('=') && !level.contains(',') => {
                format!("cmdsync={}", level.to_ascii_lowercase())
            }
            Some(custom) => custom.to_string(),
            None => profile.default_filter().to_string(),
        };
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

        match profile {
            Profile::Development => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_writer(std::io::stderr)
                    .try_init();
            }
            Profile::Production => {
                let _ = tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(env_filter)
                    .with_writer(std::io::stderr)
                    .try_init();
            }
            Profile::Test => {
                let _ = tracing_subscriber::registry().try_init();
            }
        }
    });
}
