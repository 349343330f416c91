//! # vaultcert
//!
//! Client and command-line tool for the TLS certificate auth method of a
//! Vault-compatible secrets server.
//!
//! ## Architecture
//!
//! ```text
//! CLI (clap) → VaultClient → API groups (sys, auth.cert) → Adapter → HTTP(S)
//!                   ↓                                          ↓
//!             ClientConfig / TlsConfig                PEM loading (rustls pki-types)
//! ```
//!
//! ## Core Components
//!
//! - **Client**: [`VaultClient`] holds the transport and hands out API groups
//! - **System API**: enabling, disabling and listing auth methods
//! - **Cert API**: CA certificate roles, method configuration, CRLs and login
//! - **Adapter**: `reqwest` over rustls, `X-Vault-Token` auth, status mapping
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vaultcert::{
//!     CertLogin, ClientConfig, CreateCaCertificateRole, EnableAuthMethod, PemSource, Result,
//!     VaultClient,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = VaultClient::new(ClientConfig::from_env()?)?;
//!
//!     client.sys().enable_auth_method("cert", "cert", &EnableAuthMethod::default()).await?;
//!
//!     let role = CreateCaCertificateRole::new("web", PemSource::path("ca.pem"));
//!     client.auth().cert().create_ca_certificate_role(&role, "cert").await?;
//!
//!     let login = CertLogin::new().with_name("web");
//!     let response = client.auth().cert().login(&login, "cert").await?;
//!     println!("logged in: {}", response.auth.is_some());
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod utils;

// Re-export commonly used types
pub use adapter::{Adapter, HttpAdapter, RequestMethod, RequestTls, VaultRequest};
pub use api::auth_methods::{
    Cert, CertLogin, CertRole, ConfigureTlsCertificate, CreateCaCertificateRole, CrlInfo,
    DEFAULT_MOUNT_POINT,
};
pub use api::system::{AuthMethodTuning, AuthMethods, AuthMount, EnableAuthMethod};
pub use api::{ApiResponse, AuthInfo, ListKeys, RawResponse};
pub use client::VaultClient;
pub use config::{ClientConfig, TlsConfig};
pub use errors::{Result, ServerError, TlsError, VaultError};
pub use utils::certificates::{CertificateInfo, ClientCertificate, PemSource};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
