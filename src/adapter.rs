//! HTTP transport for the secrets server API.
//!
//! [`Adapter`] is the seam between the typed API modules and the wire. The
//! production implementation, [`HttpAdapter`], uses `reqwest` over rustls,
//! sends `X-Vault-Token` / `X-Vault-Namespace` headers and maps error
//! statuses to [`VaultError`] variants.

use std::{fmt, sync::RwLock, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use tracing::{debug, trace, warn};

use crate::{
    api::response::RawResponse,
    config::ClientConfig,
    errors::{Result, VaultError},
    utils::certificates::root_certificates,
};

/// HTTP verbs used by the API, including the `LIST` extension verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Delete,
    List,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Delete => "DELETE",
            RequestMethod::List => "LIST",
        }
    }

    fn to_method(self) -> Result<Method> {
        match self {
            RequestMethod::Get => Ok(Method::GET),
            RequestMethod::Post => Ok(Method::POST),
            RequestMethod::Delete => Ok(Method::DELETE),
            RequestMethod::List => Method::from_bytes(b"LIST")
                .map_err(|e| VaultError::config(format!("invalid LIST method: {}", e))),
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request TLS material, used when a call must present its own client
/// certificate (cert login).
#[derive(Clone)]
pub struct RequestTls {
    pub identity: reqwest::Identity,
    /// Trust roots for this request; the adapter's own roots when `None`.
    pub roots: Option<Vec<reqwest::Certificate>>,
}

impl fmt::Debug for RequestTls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestTls")
            .field("identity", &"[client identity]")
            .field("roots", &self.roots.as_ref().map(Vec::len))
            .finish()
    }
}

/// A request to the API, relative to the server address.
#[derive(Debug, Clone)]
pub struct VaultRequest {
    pub method: RequestMethod,
    /// Path beginning with `/v1/`
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub tls: Option<RequestTls>,
}

impl VaultRequest {
    pub fn new(method: RequestMethod, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), body: None, tls: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Delete, path)
    }

    pub fn list(path: impl Into<String>) -> Self {
        Self::new(RequestMethod::List, path)
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_tls(mut self, tls: RequestTls) -> Self {
        self.tls = Some(tls);
        self
    }
}

/// Transport used by [`crate::VaultClient`].
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Send a request and return the successful response, or the mapped error.
    async fn send(&self, request: VaultRequest) -> Result<RawResponse>;

    /// The token currently sent with requests.
    fn token(&self) -> Option<String>;

    /// Replace the token sent with requests.
    fn set_token(&self, token: Option<String>);

    /// Server address requests are sent to.
    fn address(&self) -> &str;
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

/// `reqwest`-backed [`Adapter`].
pub struct HttpAdapter {
    client: Client,
    address: String,
    namespace: Option<String>,
    timeout: Duration,
    skip_verify: bool,
    roots: Vec<reqwest::Certificate>,
    token: RwLock<Option<String>>,
}

impl fmt::Debug for HttpAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpAdapter")
            .field("address", &self.address)
            .field("namespace", &self.namespace)
            .field("timeout", &self.timeout)
            .field("skip_verify", &self.skip_verify)
            .field("roots", &self.roots.len())
            .field("token", &self.token().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpAdapter {
    /// Build an adapter from client configuration.
    ///
    /// CA and client identity files are read here, so a bad path fails fast.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let roots = match &config.tls.ca_cert {
            Some(source) => root_certificates(source)?,
            None => Vec::new(),
        };

        let identity = match &config.tls.client_cert {
            Some(client_cert) => Some(client_cert.to_identity()?),
            None => None,
        };

        let client = Self::builder(config.timeout, config.tls.skip_verify, &roots, identity)
            .build()?;

        Ok(Self {
            client,
            address: config.address.trim_end_matches('/').to_string(),
            namespace: config.namespace.clone(),
            timeout: config.timeout,
            skip_verify: config.tls.skip_verify,
            roots,
            token: RwLock::new(config.token.clone()),
        })
    }

    fn builder(
        timeout: Duration,
        skip_verify: bool,
        roots: &[reqwest::Certificate],
        identity: Option<reqwest::Identity>,
    ) -> reqwest::ClientBuilder {
        let mut builder = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .danger_accept_invalid_certs(skip_verify);

        for root in roots {
            builder = builder.add_root_certificate(root.clone());
        }

        if let Some(identity) = identity {
            builder = builder.identity(identity);
        }

        builder
    }

    fn client_for(&self, tls: Option<RequestTls>) -> Result<Client> {
        match tls {
            None => Ok(self.client.clone()),
            Some(tls) => {
                let roots = tls.roots.as_deref().unwrap_or(&self.roots);
                Ok(Self::builder(self.timeout, self.skip_verify, roots, Some(tls.identity))
                    .build()?)
            }
        }
    }
}

#[async_trait]
impl Adapter for HttpAdapter {
    async fn send(&self, request: VaultRequest) -> Result<RawResponse> {
        let url = format!("{}{}", self.address, request.path);
        let method = request.method;
        debug!(method = %method, path = %request.path, "{} {}", method, url);

        let client = self.client_for(request.tls)?;
        let mut builder = client.request(method.to_method()?, &url);

        if let Some(token) = self.token() {
            builder = builder.header("X-Vault-Token", token);
        }
        if let Some(namespace) = &self.namespace {
            builder = builder.header("X-Vault-Namespace", namespace);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        debug!(method = %method, path = %request.path, status = status.as_u16(), "Response status");

        if status.is_success() {
            trace!(bytes = body.len(), "Response body received");
            return Ok(RawResponse { status, url, body });
        }

        let errors = serde_json::from_slice::<ErrorBody>(&body)
            .map(|parsed| parsed.errors)
            .unwrap_or_else(|_| {
                let text = String::from_utf8_lossy(&body).trim().to_string();
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![text]
                }
            });

        warn!(
            method = %method,
            path = %request.path,
            status = status.as_u16(),
            errors = ?errors,
            "Request failed"
        );

        Err(VaultError::from_status(status, errors, method.as_str(), url))
    }

    fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    fn address(&self) -> &str {
        &self.address
    }
}
