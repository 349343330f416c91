//! # Error Handling
//!
//! Error types for the vaultcert client, defined with `thiserror`.
//!
//! Errors fall into three groups:
//! - local failures raised before a request is sent (`ParamValidation`, `Io`, `Tls`, `Config`)
//! - server responses with a non-success status, one variant per documented status code
//! - transport and decoding failures around the HTTP exchange

pub mod tls;

pub use tls::TlsError;

use reqwest::StatusCode;

/// Custom result type for vaultcert operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Main error type for the vaultcert client
#[derive(thiserror::Error, Debug)]
pub enum VaultError {
    /// Caller-supplied arguments were rejected before any request was made
    #[error("Parameter validation failed: {0}")]
    ParamValidation(String),

    /// Certificate or key material could not be read from disk
    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Certificate material could not be loaded
    #[error(transparent)]
    Tls(#[from] TlsError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// 400 from the server
    #[error("{}", ServerError::describe("Invalid request", .0))]
    InvalidRequest(ServerError),

    /// 401 from the server
    #[error("{}", ServerError::describe("Unauthorized", .0))]
    Unauthorized(ServerError),

    /// 403 from the server
    #[error("{}", ServerError::describe("Forbidden", .0))]
    Forbidden(ServerError),

    /// 404 from the server
    #[error("{}", ServerError::describe("Invalid path", .0))]
    InvalidPath(ServerError),

    /// 412 from the server
    #[error("{}", ServerError::describe("Precondition failed", .0))]
    PreconditionFailed(ServerError),

    /// 429 from the server
    #[error("{}", ServerError::describe("Rate limit exceeded", .0))]
    RateLimitExceeded(ServerError),

    /// 500 from the server
    #[error("{}", ServerError::describe("Internal server error", .0))]
    InternalServerError(ServerError),

    /// 501 from the server
    #[error("{}", ServerError::describe("Vault not initialized", .0))]
    VaultNotInitialized(ServerError),

    /// 502 from the server
    #[error("{}", ServerError::describe("Bad gateway", .0))]
    BadGateway(ServerError),

    /// 503 from the server
    #[error("{}", ServerError::describe("Vault is sealed or down", .0))]
    VaultDown(ServerError),

    /// Any other non-success status
    #[error("{}", ServerError::describe("Unexpected error", .0))]
    UnexpectedError(ServerError),

    /// Network transport errors (connect, TLS handshake, timeouts)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request body could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A successful response had no `data` payload
    #[error("Response {request_id} carried no data")]
    MissingData { request_id: String },

    /// Response body could not be decoded
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Details of an error response returned by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerError {
    pub status: StatusCode,
    pub errors: Vec<String>,
    pub method: String,
    pub url: String,
}

impl ServerError {
    fn describe(kind: &str, err: &ServerError) -> String {
        if err.errors.is_empty() {
            format!("{kind} ({}) on {} {}", err.status.as_u16(), err.method, err.url)
        } else {
            format!(
                "{kind} ({}): {}, on {} {}",
                err.status.as_u16(),
                err.errors.join(", "),
                err.method,
                err.url
            )
        }
    }
}

impl VaultError {
    /// Create a new parameter validation error
    pub fn param_validation<S: Into<String>>(message: S) -> Self {
        Self::ParamValidation(message.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create an I/O error with the path or operation that failed
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Map a non-success status code to the matching error variant.
    pub fn from_status(
        status: StatusCode,
        errors: Vec<String>,
        method: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let err = ServerError { status, errors, method: method.into(), url: url.into() };
        match status.as_u16() {
            400 => Self::InvalidRequest(err),
            401 => Self::Unauthorized(err),
            403 => Self::Forbidden(err),
            404 => Self::InvalidPath(err),
            412 => Self::PreconditionFailed(err),
            429 => Self::RateLimitExceeded(err),
            500 => Self::InternalServerError(err),
            501 => Self::VaultNotInitialized(err),
            502 => Self::BadGateway(err),
            503 => Self::VaultDown(err),
            _ => Self::UnexpectedError(err),
        }
    }

    /// Server-side details, if this error came from an HTTP response.
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            Self::InvalidRequest(e)
            | Self::Unauthorized(e)
            | Self::Forbidden(e)
            | Self::InvalidPath(e)
            | Self::PreconditionFailed(e)
            | Self::RateLimitExceeded(e)
            | Self::InternalServerError(e)
            | Self::VaultNotInitialized(e)
            | Self::BadGateway(e)
            | Self::VaultDown(e)
            | Self::UnexpectedError(e) => Some(e),
            _ => None,
        }
    }

    /// HTTP status of the failed response, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.server_error().map(|e| e.status)
    }

    /// True for errors raised locally before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::ParamValidation(_) | Self::Io { .. } | Self::Tls(_) | Self::Config(_))
    }
}
