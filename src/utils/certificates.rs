use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use rustls::pki_types::{
    pem::PemObject, CertificateDer, CertificateRevocationListDer, PrivateKeyDer,
};
use zeroize::Zeroizing;

use crate::errors::{Result, TlsError, VaultError};

/// Where a piece of PEM material comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum PemSource {
    /// PEM text passed directly.
    Inline(String),
    /// A file containing PEM text.
    Path(PathBuf),
}

impl fmt::Debug for PemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Inline material may be a private key.
            PemSource::Inline(pem) => write!(f, "Inline([{} bytes PEM])", pem.len()),
            PemSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
        }
    }
}

impl PemSource {
    pub fn inline(pem: impl Into<String>) -> Self {
        Self::Inline(pem.into())
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Interpret a command-line style argument: PEM text if it starts with a
    /// PEM header, otherwise a file path.
    pub fn from_arg(arg: &str) -> Self {
        if arg.trim_start().starts_with("-----BEGIN") {
            Self::Inline(arg.to_string())
        } else {
            Self::Path(PathBuf::from(arg))
        }
    }

    /// Human-readable origin used in error messages.
    pub fn origin(&self) -> String {
        match self {
            PemSource::Inline(_) => "inline".to_string(),
            PemSource::Path(path) => path.display().to_string(),
        }
    }

    /// Read the raw bytes. Only file access can fail here.
    pub fn read(&self) -> Result<Zeroizing<Vec<u8>>> {
        match self {
            PemSource::Inline(pem) => Ok(Zeroizing::new(pem.as_bytes().to_vec())),
            PemSource::Path(path) => read_file(path),
        }
    }
}

fn read_file(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    fs::read(path)
        .map(Zeroizing::new)
        .map_err(|e| VaultError::io(format!("failed to read {}", path.display()), e))
}

/// Metadata extracted from a certificate for logging and validation.
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub is_ca: bool,
}

impl CertificateInfo {
    pub fn is_expired(&self) -> bool {
        self.not_after < Utc::now()
    }
}

/// A client certificate and its private key, used as the mTLS identity on login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCertificate {
    pub cert: PemSource,
    pub key: PemSource,
}

impl ClientCertificate {
    pub fn new(cert: PemSource, key: PemSource) -> Self {
        Self { cert, key }
    }

    /// Validate both halves and assemble a `reqwest` identity.
    ///
    /// Logs a warning when the leaf is outside its validity window; the
    /// server is left to reject it.
    pub fn to_identity(&self) -> Result<reqwest::Identity> {
        let cert_pem = self.cert.read()?;
        let certs = parse_certificates(&cert_pem, &self.cert, "Client certificate")?;
        let key_pem = self.key.read()?;
        parse_private_key(&key_pem, &self.key)?;

        if let Some(leaf) = certs.first() {
            let info = certificate_info(leaf, &self.cert.origin())?;
            if info.is_expired() {
                tracing::warn!(
                    subject = %info.subject,
                    not_after = %info.not_after,
                    "Client certificate has expired"
                );
            }
        }

        let mut bundle = Zeroizing::new(Vec::with_capacity(cert_pem.len() + key_pem.len() + 1));
        bundle.extend_from_slice(&key_pem);
        bundle.push(b'\n');
        bundle.extend_from_slice(&cert_pem);

        reqwest::Identity::from_pem(&bundle)
            .map_err(|source| TlsError::Rejected { origin: self.cert.origin(), source }.into())
    }
}

/// Load every certificate in a PEM source, failing if there are none.
pub fn load_certificates(
    source: &PemSource,
    what: &'static str,
) -> Result<Vec<CertificateDer<'static>>> {
    parse_certificates(&source.read()?, source, what)
}

fn parse_certificates(
    bytes: &[u8],
    source: &PemSource,
    what: &'static str,
) -> Result<Vec<CertificateDer<'static>>> {
    let certs: Vec<CertificateDer<'static>> = CertificateDer::pem_slice_iter(bytes)
        .map(|result| {
            result.map_err(|err| TlsError::InvalidCertificatePem {
                what,
                origin: source.origin(),
                reason: format!("{err:?}"),
            })
        })
        .collect::<std::result::Result<_, _>>()?;

    if certs.is_empty() {
        return Err(TlsError::EmptyCertificateChain { what, origin: source.origin() }.into());
    }

    Ok(certs)
}

/// Load the first private key in a PEM source.
pub fn load_private_key(source: &PemSource) -> Result<PrivateKeyDer<'static>> {
    parse_private_key(&source.read()?, source)
}

fn parse_private_key(bytes: &[u8], source: &PemSource) -> Result<PrivateKeyDer<'static>> {
    PrivateKeyDer::from_pem_slice(bytes)
        .map_err(|_| TlsError::InvalidPrivateKey { origin: source.origin() }.into())
}

/// Validate that a source holds PEM certificates and return its text, ready
/// to be sent in a request body.
pub fn certificate_pem(source: &PemSource, what: &'static str) -> Result<String> {
    let bytes = source.read()?;
    parse_certificates(&bytes, source, what)?;
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        TlsError::InvalidCertificatePem {
            what,
            origin: source.origin(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Validate that a source holds at least one PEM `X509 CRL` and return its text.
pub fn crl_pem(source: &PemSource) -> Result<String> {
    let bytes = source.read()?;

    let count = CertificateRevocationListDer::pem_slice_iter(&bytes)
        .map(|result| {
            result.map_err(|err| TlsError::InvalidCertificatePem {
                what: "CRL",
                origin: source.origin(),
                reason: format!("{err:?}"),
            })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?
        .len();

    if count == 0 {
        return Err(
            TlsError::EmptyCertificateChain { what: "CRL", origin: source.origin() }.into()
        );
    }

    String::from_utf8(bytes.to_vec()).map_err(|e| {
        TlsError::InvalidCertificatePem {
            what: "CRL",
            origin: source.origin(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Convert a CA bundle into root certificates for the HTTP client.
pub fn root_certificates(source: &PemSource) -> Result<Vec<reqwest::Certificate>> {
    load_certificates(source, "CA certificate")?
        .iter()
        .map(|der| {
            reqwest::Certificate::from_der(der.as_ref()).map_err(|source_err| {
                VaultError::from(TlsError::Rejected { origin: source.origin(), source: source_err })
            })
        })
        .collect()
}

/// Parse subject, issuer and validity from a DER certificate.
pub fn certificate_info(cert: &CertificateDer<'_>, origin: &str) -> Result<CertificateInfo> {
    let (_, parsed) = x509_parser::parse_x509_certificate(cert.as_ref()).map_err(|err| {
        TlsError::CertificateMetadata { origin: origin.to_string(), reason: err.to_string() }
    })?;

    let validity = parsed.validity();
    let not_before = timestamp(validity.not_before.timestamp(), origin)?;
    let not_after = timestamp(validity.not_after.timestamp(), origin)?;

    Ok(CertificateInfo {
        subject: parsed.subject().to_string(),
        issuer: parsed.issuer().to_string(),
        not_before,
        not_after,
        is_ca: parsed.is_ca(),
    })
}

fn timestamp(secs: i64, origin: &str) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
        TlsError::CertificateMetadata {
            origin: origin.to_string(),
            reason: format!("timestamp {secs} out of range"),
        }
        .into()
    })
}
