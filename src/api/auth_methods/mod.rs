//! Auth method endpoints mounted under `/v1/auth`.

pub mod cert;

pub use cert::{
    Cert, CertLogin, CertRole, ConfigureTlsCertificate, CreateCaCertificateRole, CrlInfo,
    DEFAULT_MOUNT_POINT,
};

use std::sync::Arc;

use crate::{adapter::Adapter, utils::certificates::ClientCertificate};

/// Entry point for the auth methods a client can talk to.
#[derive(Clone)]
pub struct AuthMethodsApi {
    adapter: Arc<dyn Adapter>,
    default_identity: Option<ClientCertificate>,
}

impl AuthMethodsApi {
    pub fn new(adapter: Arc<dyn Adapter>, default_identity: Option<ClientCertificate>) -> Self {
        Self { adapter, default_identity }
    }

    /// TLS certificate auth method.
    pub fn cert(&self) -> Cert {
        Cert::new(self.adapter.clone(), self.default_identity.clone())
    }
}
