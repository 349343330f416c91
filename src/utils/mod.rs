//! # Utilities
//!
//! Helpers for handling PEM certificate and key material.

pub mod certificates;

pub use certificates::{
    certificate_info, certificate_pem, crl_pem, load_certificates, load_private_key,
    root_certificates, CertificateInfo, ClientCertificate, PemSource,
};
