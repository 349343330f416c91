//! # Structured Logging
//!
//! Subscriber setup and span helpers built on the tracing ecosystem.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use crate::errors::{Result, VaultError};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = VaultError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(VaultError::config(format!(
                "Unknown log format '{}': expected 'pretty' or 'json'",
                other
            ))),
        }
    }
}

/// Build the level filter: `RUST_LOG` when set, otherwise `debug` for verbose
/// runs and `warn` for everything else.
pub fn env_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "warn" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed (tests, embedding
/// applications); the existing one is left in place.
pub fn init_logging(verbose: bool, format: LogFormat) -> bool {
    let builder =
        tracing_subscriber::fmt().with_env_filter(env_filter(verbose)).with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Pretty => builder.with_target(false).compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.is_ok()
}

/// Create a span for a call against the secrets server API.
///
/// ```rust,ignore
/// let span = vault_span!("login", "cert");
/// let span = vault_span!("create_role", "cert-test", role = "testrole");
/// ```
#[macro_export]
macro_rules! vault_span {
    ($operation:expr, $mount:expr) => {
        tracing::info_span!(
            "vault_operation",
            operation = %$operation,
            mount = %$mount,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $mount:expr, $($field:tt)*) => {
        tracing::info_span!(
            "vault_operation",
            operation = %$operation,
            mount = %$mount,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}
