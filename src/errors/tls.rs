use thiserror::Error;

/// Failures while loading certificate, key or CA material supplied by the caller.
///
/// `origin` is either a file path or `"inline"` for PEM passed as a string.
#[derive(Debug, Error)]
pub enum TlsError {
    /// The source did not contain any PEM certificates.
    #[error("{what} from {origin} does not contain any PEM certificates")]
    EmptyCertificateChain { what: &'static str, origin: String },

    /// The certificate PEM contents were invalid or unreadable.
    #[error("{what} from {origin} is not a valid PEM: {reason}")]
    InvalidCertificatePem { what: &'static str, origin: String, reason: String },

    /// The private key PEM contents were invalid or unsupported.
    #[error("Private key from {origin} does not contain a supported private key")]
    InvalidPrivateKey { origin: String },

    /// The certificate DER could not be parsed for metadata.
    #[error("Failed to extract certificate metadata from {origin}: {reason}")]
    CertificateMetadata { origin: String, reason: String },

    /// The HTTP stack rejected the assembled identity or root certificate.
    #[error("TLS material from {origin} was rejected: {source}")]
    Rejected {
        origin: String,
        #[source]
        source: reqwest::Error,
    },
}
