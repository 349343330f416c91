use crate::{
    errors::{Result, VaultError},
    utils::certificates::{ClientCertificate, PemSource},
};

/// Client-level TLS settings applied to every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    /// CA bundle used to verify the server; system roots when unset.
    pub ca_cert: Option<PemSource>,
    /// Default mTLS identity, also used by cert login when none is passed.
    pub client_cert: Option<ClientCertificate>,
    /// Accept any server certificate.
    pub skip_verify: bool,
}

impl TlsConfig {
    /// Load TLS configuration from the standard `VAULT_*` environment variables.
    ///
    /// `VAULT_CLIENT_CERT` and `VAULT_CLIENT_KEY` must be set together.
    pub fn from_env() -> Result<Self> {
        let ca_cert = non_empty_var("VAULT_CACERT").map(PemSource::path);

        let client_cert =
            match (non_empty_var("VAULT_CLIENT_CERT"), non_empty_var("VAULT_CLIENT_KEY")) {
                (Some(cert), Some(key)) => {
                    Some(ClientCertificate::new(PemSource::path(cert), PemSource::path(key)))
                }
                (None, None) => None,
                (Some(_), None) => {
                    return Err(VaultError::config(
                        "VAULT_CLIENT_CERT is set but VAULT_CLIENT_KEY is not",
                    ))
                }
                (None, Some(_)) => {
                    return Err(VaultError::config(
                        "VAULT_CLIENT_KEY is set but VAULT_CLIENT_CERT is not",
                    ))
                }
            };

        let skip_verify = std::env::var("VAULT_SKIP_VERIFY")
            .ok()
            .map(|value| parse_flag(&value))
            .unwrap_or(false);

        Ok(Self { ca_cert, client_cert, skip_verify })
    }
}

pub(crate) fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
