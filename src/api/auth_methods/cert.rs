//! TLS certificate (mTLS) auth method.
//!
//! Roles bind a trusted CA certificate to token settings; a client that
//! presents a certificate signed by that CA during the TLS handshake can log
//! in against the role.
//!
//! Certificate, key and CA arguments are checked locally before a request is
//! sent:
//!
//! | Input | Result |
//! |---|---|
//! | inline text that is not PEM | [`VaultError::ParamValidation`] |
//! | CA path that is missing or not PEM | [`VaultError::ParamValidation`] |
//! | client cert/key path that cannot be read | [`VaultError::Io`] |
//! | client cert/key file that is not PEM | [`VaultError::ParamValidation`] |
//!
//! # Example
//!
//! ```rust,no_run
//! use vaultcert::{CertLogin, ClientCertificate, ClientConfig, PemSource, VaultClient};
//!
//! # async fn run() -> vaultcert::Result<()> {
//! let client = VaultClient::new(ClientConfig::from_env()?)?;
//! let login = CertLogin::new()
//!     .with_name("web")
//!     .with_client_cert(ClientCertificate::new(
//!         PemSource::path("/etc/vault/client.pem"),
//!         PemSource::path("/etc/vault/client-key.pem"),
//!     ));
//! let response = client.auth().cert().login(&login, "cert").await?;
//! println!("policies: {:?}", response.auth.map(|a| a.policies));
//! # Ok(())
//! # }
//! ```

use std::{collections::HashMap, sync::Arc};

use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, Instrument};

use crate::{
    adapter::{Adapter, RequestTls, VaultRequest},
    api::{
        mount_segment, name_segment,
        response::{ApiResponse, ListKeys},
    },
    errors::{Result, VaultError},
    utils::certificates::{
        certificate_pem, crl_pem, root_certificates, ClientCertificate, PemSource,
    },
};

/// Mount point the cert auth method uses unless told otherwise.
pub const DEFAULT_MOUNT_POINT: &str = "cert";

/// Parameters for creating or updating a CA certificate role.
///
/// Empty lists and unset options are left out of the request so the server
/// keeps its defaults.
#[derive(Debug, Clone, Default)]
pub struct CreateCaCertificateRole {
    pub name: String,
    /// Trusted CA (or leaf) certificate clients must chain to
    pub certificate: Option<PemSource>,
    /// Defaults to the role name on the server
    pub display_name: Option<String>,
    pub allowed_common_names: Vec<String>,
    pub allowed_dns_sans: Vec<String>,
    pub allowed_email_sans: Vec<String>,
    pub allowed_uri_sans: Vec<String>,
    pub allowed_organizational_units: Vec<String>,
    pub required_extensions: Vec<String>,
    /// Durations accept seconds or duration strings such as `1h`
    pub token_ttl: Option<String>,
    pub token_max_ttl: Option<String>,
    pub token_explicit_max_ttl: Option<String>,
    pub token_period: Option<String>,
    pub token_policies: Vec<String>,
    pub token_bound_cidrs: Vec<String>,
    pub token_no_default_policy: bool,
    pub token_num_uses: Option<u64>,
    /// `service`, `batch`, `default`, ...
    pub token_type: Option<String>,
}

impl CreateCaCertificateRole {
    pub fn new(name: impl Into<String>, certificate: PemSource) -> Self {
        Self { name: name.into(), certificate: Some(certificate), ..Self::default() }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_allowed_common_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_common_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_token_policies<I, S>(mut self, policies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.token_policies = policies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_token_ttl(mut self, ttl: impl Into<String>) -> Self {
        self.token_ttl = Some(ttl.into());
        self
    }

    pub fn with_token_max_ttl(mut self, ttl: impl Into<String>) -> Self {
        self.token_max_ttl = Some(ttl.into());
        self
    }

    fn body(&self, certificate: Option<String>) -> RoleBody<'_> {
        RoleBody {
            certificate,
            display_name: self.display_name.as_deref(),
            allowed_common_names: &self.allowed_common_names,
            allowed_dns_sans: &self.allowed_dns_sans,
            allowed_email_sans: &self.allowed_email_sans,
            allowed_uri_sans: &self.allowed_uri_sans,
            allowed_organizational_units: &self.allowed_organizational_units,
            required_extensions: &self.required_extensions,
            token_ttl: self.token_ttl.as_deref(),
            token_max_ttl: self.token_max_ttl.as_deref(),
            token_explicit_max_ttl: self.token_explicit_max_ttl.as_deref(),
            token_period: self.token_period.as_deref(),
            token_policies: &self.token_policies,
            token_bound_cidrs: &self.token_bound_cidrs,
            token_no_default_policy: self.token_no_default_policy,
            token_num_uses: self.token_num_uses,
            token_type: self.token_type.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct RoleBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    certificate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "is_empty")]
    allowed_common_names: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    allowed_dns_sans: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    allowed_email_sans: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    allowed_uri_sans: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    allowed_organizational_units: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    required_extensions: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    token_ttl: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_max_ttl: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_explicit_max_ttl: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_period: Option<&'a str>,
    #[serde(skip_serializing_if = "is_empty")]
    token_policies: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    token_bound_cidrs: &'a [String],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    token_no_default_policy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_num_uses: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_type: Option<&'a str>,
}

fn is_empty(values: &&[String]) -> bool {
    values.is_empty()
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A CA certificate role as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CertRole {
    pub certificate: String,
    pub display_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub allowed_common_names: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub allowed_dns_sans: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub allowed_email_sans: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub allowed_uri_sans: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub allowed_organizational_units: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub required_extensions: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub token_policies: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub token_bound_cidrs: Vec<String>,
    pub token_ttl: u64,
    pub token_max_ttl: u64,
    pub token_explicit_max_ttl: u64,
    pub token_period: u64,
    pub token_no_default_policy: bool,
    pub token_num_uses: u64,
    pub token_type: String,
}

/// Settings for `POST /v1/auth/{mount}/config`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ConfigureTlsCertificate {
    /// Skip matching the presented certificate against the role on token renewal
    pub disable_binding: bool,
    /// Attach the certificate's common name to the identity alias metadata
    pub enable_identity_alias_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocsp_cache_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_cache_size: Option<i64>,
}

/// A stored certificate revocation list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CrlInfo {
    /// Revoked serial numbers
    #[serde(default, deserialize_with = "null_as_default")]
    pub serials: HashMap<String, serde_json::Value>,
}

/// Arguments for a certificate login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertLogin {
    /// Role to log in against; the server tries every role when unset or empty
    pub name: Option<String>,
    /// CA bundle used to verify the server for this login
    pub ca_cert: Option<PemSource>,
    /// Client identity presented in the handshake; the client's configured
    /// identity when unset
    pub client_cert: Option<ClientCertificate>,
    /// Install the returned client token on the client
    pub use_token: bool,
}

impl Default for CertLogin {
    fn default() -> Self {
        Self { name: None, ca_cert: None, client_cert: None, use_token: true }
    }
}

impl CertLogin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_ca_cert(mut self, ca_cert: PemSource) -> Self {
        self.ca_cert = Some(ca_cert);
        self
    }

    pub fn with_client_cert(mut self, client_cert: ClientCertificate) -> Self {
        self.client_cert = Some(client_cert);
        self
    }

    pub fn without_token(mut self) -> Self {
        self.use_token = false;
        self
    }

    fn role(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Any failure to load a CA bundle is a bad argument, including a missing file.
fn invalid_ca(err: VaultError) -> VaultError {
    VaultError::param_validation(format!("invalid CA certificate: {}", err))
}

/// Bad PEM content is a bad argument; an unreadable path stays an I/O error.
fn invalid_material(err: VaultError) -> VaultError {
    match err {
        VaultError::Io { .. } => err,
        VaultError::Tls(tls) => VaultError::param_validation(tls.to_string()),
        other => other,
    }
}

/// Cert auth method endpoints under `/v1/auth/{mount}`.
#[derive(Clone)]
pub struct Cert {
    adapter: Arc<dyn Adapter>,
    default_identity: Option<ClientCertificate>,
}

impl Cert {
    pub fn new(adapter: Arc<dyn Adapter>, default_identity: Option<ClientCertificate>) -> Self {
        Self { adapter, default_identity }
    }

    /// Create or update a CA certificate role. Returns `204` on success.
    pub async fn create_ca_certificate_role(
        &self,
        role: &CreateCaCertificateRole,
        mount_point: &str,
    ) -> Result<StatusCode> {
        let mount = mount_segment(mount_point)?;
        let name = name_segment(&role.name, "role name")?;

        let certificate = role
            .certificate
            .as_ref()
            .map(|source| certificate_pem(source, "Role certificate"))
            .transpose()
            .map_err(invalid_material)?;

        let body = serde_json::to_value(role.body(certificate))?;
        let response = self
            .adapter
            .send(VaultRequest::post(format!("/v1/auth/{}/certs/{}", mount, name)).with_body(body))
            .await?;

        info!(mount = %mount, role = %name, "CA certificate role written");
        Ok(response.status)
    }

    /// Read a CA certificate role.
    pub async fn read_ca_certificate_role(
        &self,
        name: &str,
        mount_point: &str,
    ) -> Result<ApiResponse<CertRole>> {
        let mount = mount_segment(mount_point)?;
        let name = name_segment(name, "role name")?;

        self.adapter
            .send(VaultRequest::get(format!("/v1/auth/{}/certs/{}", mount, name)))
            .await?
            .json()
    }

    /// List the names of all CA certificate roles.
    ///
    /// The server answers `404` when no roles exist, surfaced as
    /// [`VaultError::InvalidPath`].
    pub async fn list_certificate_roles(&self, mount_point: &str) -> Result<ApiResponse<ListKeys>> {
        let mount = mount_segment(mount_point)?;

        self.adapter.send(VaultRequest::list(format!("/v1/auth/{}/certs", mount))).await?.json()
    }

    /// Delete a CA certificate role. Returns `204` on success.
    pub async fn delete_certificate_role(
        &self,
        name: &str,
        mount_point: &str,
    ) -> Result<StatusCode> {
        let mount = mount_segment(mount_point)?;
        let name = name_segment(name, "role name")?;

        let response = self
            .adapter
            .send(VaultRequest::delete(format!("/v1/auth/{}/certs/{}", mount, name)))
            .await?;

        info!(mount = %mount, role = %name, "CA certificate role deleted");
        Ok(response.status)
    }

    /// Configure the cert auth method. Returns `204` on success.
    pub async fn configure_tls_certificate(
        &self,
        config: &ConfigureTlsCertificate,
        mount_point: &str,
    ) -> Result<StatusCode> {
        let mount = mount_segment(mount_point)?;
        let body = serde_json::to_value(config)?;

        let response = self
            .adapter
            .send(VaultRequest::post(format!("/v1/auth/{}/config", mount)).with_body(body))
            .await?;

        info!(
            mount = %mount,
            disable_binding = config.disable_binding,
            enable_identity_alias_metadata = config.enable_identity_alias_metadata,
            "Cert auth method configured"
        );
        Ok(response.status)
    }

    /// Store a PEM certificate revocation list under `name`. Returns `204` on success.
    pub async fn create_crl(
        &self,
        name: &str,
        crl: &PemSource,
        mount_point: &str,
    ) -> Result<StatusCode> {
        let mount = mount_segment(mount_point)?;
        let name = name_segment(name, "CRL name")?;
        let crl = crl_pem(crl).map_err(invalid_material)?;

        let response = self
            .adapter
            .send(
                VaultRequest::post(format!("/v1/auth/{}/crls/{}", mount, name))
                    .with_body(serde_json::json!({ "crl": crl })),
            )
            .await?;

        info!(mount = %mount, crl = %name, "CRL written");
        Ok(response.status)
    }

    /// Read a stored certificate revocation list.
    pub async fn read_crl(&self, name: &str, mount_point: &str) -> Result<ApiResponse<CrlInfo>> {
        let mount = mount_segment(mount_point)?;
        let name = name_segment(name, "CRL name")?;

        self.adapter
            .send(VaultRequest::get(format!("/v1/auth/{}/crls/{}", mount, name)))
            .await?
            .json()
    }

    /// Delete a stored certificate revocation list. Returns `204` on success.
    pub async fn delete_crl(&self, name: &str, mount_point: &str) -> Result<StatusCode> {
        let mount = mount_segment(mount_point)?;
        let name = name_segment(name, "CRL name")?;

        let response = self
            .adapter
            .send(VaultRequest::delete(format!("/v1/auth/{}/crls/{}", mount, name)))
            .await?;

        info!(mount = %mount, crl = %name, "CRL deleted");
        Ok(response.status)
    }

    /// Log in with a client certificate.
    ///
    /// All certificate material is validated before the request is sent. On
    /// success the response carries an `auth` block; with `use_token` its
    /// client token replaces the client's current token.
    pub async fn login(
        &self,
        login: &CertLogin,
        mount_point: &str,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let mount = mount_segment(mount_point)?;
        let tls = self.login_tls(login)?;

        let mut body = serde_json::Map::new();
        if let Some(role) = login.role() {
            body.insert("name".to_string(), serde_json::Value::String(role.to_string()));
        }

        let mut request = VaultRequest::post(format!("/v1/auth/{}/login", mount))
            .with_body(serde_json::Value::Object(body));
        if let Some(tls) = tls {
            request = request.with_tls(tls);
        }

        let response: ApiResponse<serde_json::Value> = self
            .adapter
            .send(request)
            .instrument(crate::vault_span!("cert_login", mount, role = ?login.role()))
            .await?
            .json()?;

        match &response.auth {
            Some(auth) => {
                info!(
                    mount = %mount,
                    role = login.role().unwrap_or("<any>"),
                    policies = ?auth.policies,
                    "Certificate login succeeded"
                );
                if login.use_token {
                    self.adapter.set_token(Some(auth.client_token.clone()));
                }
            }
            None => debug!(mount = %mount, "Login response carried no auth block"),
        }

        Ok(response)
    }

    /// Resolve the TLS material for a login, or `None` to reuse the client's
    /// own connection settings.
    fn login_tls(&self, login: &CertLogin) -> Result<Option<RequestTls>> {
        let roots = login
            .ca_cert
            .as_ref()
            .map(root_certificates)
            .transpose()
            .map_err(invalid_ca)?;

        let identity = match (&login.client_cert, &self.default_identity) {
            (Some(client_cert), _) => client_cert.to_identity().map_err(invalid_material)?,
            (None, Some(_)) if roots.is_none() => return Ok(None),
            (None, Some(default)) => default.to_identity().map_err(invalid_material)?,
            (None, None) => {
                return Err(VaultError::param_validation(
                    "no client certificate supplied and none configured on the client",
                ))
            }
        };

        Ok(Some(RequestTls { identity, roots }))
    }
}
