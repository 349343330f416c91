//! Configuration file handling for the vaultcert CLI
//!
//! Loads defaults from ~/.vaultcert/config.toml and resolves connection
//! settings from flags, environment variables and that file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::config::{
    tls::{non_empty_var, parse_flag},
    ClientConfig, TlsConfig, DEFAULT_ADDRESS, DEFAULT_TIMEOUT_SECS,
};
use crate::utils::certificates::{ClientCertificate, PemSource};

/// CLI configuration stored in ~/.vaultcert/config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    /// Server address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Client token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// CA bundle path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_cert: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_key: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_verify: Option<bool>,

    /// Request timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl CliConfig {
    /// Get the default configuration file path (~/.vaultcert/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Unable to determine home directory")?;

        let mut path = PathBuf::from(home);
        path.push(".vaultcert");
        path.push("config.toml");

        Ok(path)
    }

    /// Load configuration from the default path, or defaults when it does not exist
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_path()?)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

/// Connection flags given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConnectionFlags {
    pub address: Option<String>,
    pub token: Option<String>,
    pub namespace: Option<String>,
    pub ca_cert: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
    pub skip_verify: bool,
    pub timeout: Option<u64>,
}

/// Pick the first of flag, environment variable and config file value.
fn resolve<T>(
    label: &str,
    flag: Option<T>,
    env_name: &str,
    parse_env: impl FnOnce(String) -> Result<T>,
    file: Option<T>,
) -> Result<Option<T>> {
    if let Some(value) = flag {
        debug!("Using {} from command line flag", label);
        return Ok(Some(value));
    }

    if let Some(raw) = non_empty_var(env_name) {
        debug!("Using {} from {} environment variable", label, env_name);
        return parse_env(raw).map(Some);
    }

    if file.is_some() {
        debug!("Using {} from config file", label);
    }
    Ok(file)
}

/// Resolve the client configuration.
///
/// Checks sources in the following priority order:
/// 1. command line flags
/// 2. `VAULT_*` / `VAULTCERT_TIMEOUT_SECS` environment variables
/// 3. ~/.vaultcert/config.toml
/// 4. built-in defaults
pub fn resolve_client_config(flags: ConnectionFlags, file: CliConfig) -> Result<ClientConfig> {
    let text = |raw: String| -> Result<String> { Ok(raw) };
    let path = |raw: String| -> Result<PathBuf> { Ok(PathBuf::from(raw)) };

    let address = resolve("address", flags.address, "VAULT_ADDR", text, file.address)?
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
    let token = resolve("token", flags.token, "VAULT_TOKEN", text, file.token)?;
    let namespace = resolve("namespace", flags.namespace, "VAULT_NAMESPACE", text, file.namespace)?;
    let ca_cert = resolve("CA certificate", flags.ca_cert, "VAULT_CACERT", path, file.ca_cert)?;
    let client_cert = resolve(
        "client certificate",
        flags.client_cert,
        "VAULT_CLIENT_CERT",
        path,
        file.client_cert,
    )?;
    let client_key =
        resolve("client key", flags.client_key, "VAULT_CLIENT_KEY", path, file.client_key)?;

    let skip_verify = resolve(
        "skip-verify",
        flags.skip_verify.then_some(true),
        "VAULT_SKIP_VERIFY",
        |raw| Ok(parse_flag(&raw)),
        file.skip_verify,
    )?
    .unwrap_or(false);

    let timeout = resolve(
        "timeout",
        flags.timeout,
        "VAULTCERT_TIMEOUT_SECS",
        |raw| {
            raw.parse::<u64>()
                .with_context(|| format!("Invalid VAULTCERT_TIMEOUT_SECS '{}'", raw))
        },
        file.timeout,
    )?
    .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let client_cert = match (client_cert, client_key) {
        (Some(cert), Some(key)) => {
            Some(ClientCertificate::new(PemSource::path(cert), PemSource::path(key)))
        }
        (None, None) => None,
        _ => anyhow::bail!("--client-cert and --client-key must be given together"),
    };

    let mut config = ClientConfig::new(address)
        .with_timeout(Duration::from_secs(timeout))
        .with_tls(TlsConfig { ca_cert: ca_cert.map(PemSource::path), client_cert, skip_verify });
    config.token = token;
    config.namespace = namespace;

    config.validate().context("Invalid client configuration")?;
    Ok(config)
}
