//! Client for the secrets server.
//!
//! [`VaultClient`] owns the transport and hands out typed API groups:
//!
//! ```rust,no_run
//! use vaultcert::{ClientConfig, EnableAuthMethod, VaultClient};
//!
//! # async fn run() -> vaultcert::Result<()> {
//! let config = ClientConfig::new("https://vault.local:8200").with_token("root");
//! let client = VaultClient::new(config)?;
//! client.sys().enable_auth_method("cert", "cert-test", &EnableAuthMethod::default()).await?;
//! let roles = client.auth().cert().list_certificate_roles("cert-test").await;
//! # Ok(())
//! # }
//! ```

use std::{fmt, sync::Arc};

use tracing::debug;

use crate::{
    adapter::{Adapter, HttpAdapter},
    api::{auth_methods::AuthMethodsApi, system::AuthMethods},
    config::ClientConfig,
    errors::Result,
    utils::certificates::ClientCertificate,
};

/// Handle to a secrets server. Cheap to clone; clones share the token.
#[derive(Clone)]
pub struct VaultClient {
    adapter: Arc<dyn Adapter>,
    default_identity: Option<ClientCertificate>,
}

impl fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultClient")
            .field("address", &self.adapter.address())
            .field("token", &self.adapter.token().map(|_| "[REDACTED]"))
            .field("client_cert", &self.default_identity.is_some())
            .finish()
    }
}

impl VaultClient {
    /// Create a client over HTTP(S) from configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let adapter = HttpAdapter::new(&config)?;
        debug!(address = %config.address, namespace = ?config.namespace, "Created client");

        Ok(Self { adapter: Arc::new(adapter), default_identity: config.tls.client_cert })
    }

    /// Create a client from `VAULT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client over a custom transport.
    pub fn with_adapter(
        adapter: Arc<dyn Adapter>,
        default_identity: Option<ClientCertificate>,
    ) -> Self {
        Self { adapter, default_identity }
    }

    pub fn address(&self) -> &str {
        self.adapter.address()
    }

    /// Token currently sent with requests.
    pub fn token(&self) -> Option<String> {
        self.adapter.token()
    }

    pub fn set_token(&self, token: Option<String>) {
        self.adapter.set_token(token);
    }

    /// System backend: auth method mounts.
    pub fn sys(&self) -> AuthMethods {
        AuthMethods::new(self.adapter.clone())
    }

    /// Auth methods.
    pub fn auth(&self) -> AuthMethodsApi {
        AuthMethodsApi::new(self.adapter.clone(), self.default_identity.clone())
    }
}
