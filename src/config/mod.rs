//! # Configuration Management
//!
//! Client configuration for vaultcert, loaded from the same environment
//! variables the server's own tooling uses.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `VAULT_ADDR` | server address | `http://127.0.0.1:8200` |
//! | `VAULT_TOKEN` | client token | none |
//! | `VAULT_NAMESPACE` | Enterprise namespace | none |
//! | `VAULT_CACERT` | CA bundle path | system roots |
//! | `VAULT_CLIENT_CERT` / `VAULT_CLIENT_KEY` | default mTLS identity | none |
//! | `VAULT_SKIP_VERIFY` | accept any server certificate | `false` |
//! | `VAULTCERT_TIMEOUT_SECS` | request timeout | `30` |

pub mod tls;

pub use tls::TlsConfig;

use std::{fmt, time::Duration};

use crate::errors::{Result, VaultError};
use tls::non_empty_var;

/// Default server address
pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:8200";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for a [`crate::VaultClient`].
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server address, e.g. `https://vault.example.com:8200`
    pub address: String,
    /// Client token sent as `X-Vault-Token`
    pub token: Option<String>,
    /// Namespace sent as `X-Vault-Namespace`
    pub namespace: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// TLS settings
    pub tls: TlsConfig,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("namespace", &self.namespace)
            .field("timeout", &self.timeout)
            .field("tls", &self.tls)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            token: None,
            namespace: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            tls: TlsConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given address with defaults elsewhere.
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), ..Self::default() }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let address = non_empty_var("VAULT_ADDR").unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

        let timeout_secs = match non_empty_var("VAULTCERT_TIMEOUT_SECS") {
            Some(value) => value.parse::<u64>().map_err(|e| {
                VaultError::config(format!("Invalid VAULTCERT_TIMEOUT_SECS '{}': {}", value, e))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            address,
            token: non_empty_var("VAULT_TOKEN"),
            namespace: non_empty_var("VAULT_NAMESPACE"),
            timeout: Duration::from_secs(timeout_secs),
            tls: TlsConfig::from_env()?,
        };
        config.validate()?;

        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    /// Check the address is an absolute http(s) URL and the timeout is non-zero.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.address)
            .map_err(|e| VaultError::config(format!("Invalid address '{}': {}", self.address, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(VaultError::config(format!(
                "Address '{}' must use http or https",
                self.address
            )));
        }

        if self.timeout.is_zero() {
            return Err(VaultError::config("Timeout must be greater than zero"));
        }

        Ok(())
    }
}
