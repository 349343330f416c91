//! Ephemeral certificate material for tests.

use std::{fs, path::PathBuf};

use anyhow::Context;
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use tempfile::TempDir;

use vaultcert::{ClientCertificate, PemSource};

/// A test CA and a client certificate it signed, written to a temp directory.
pub struct TestCertificateFiles {
    temp_dir: TempDir,
    pub ca_pem: String,
    pub client_cert_pem: String,
    pub client_key_pem: String,
    pub ca_path: PathBuf,
    pub client_cert_path: PathBuf,
    pub client_key_path: PathBuf,
}

impl TestCertificateFiles {
    pub fn generate() -> anyhow::Result<Self> {
        let ca_key = KeyPair::generate().context("generate CA key")?;
        let mut ca_params = CertificateParams::new(Vec::<String>::new()).context("CA params")?;
        ca_params.distinguished_name.push(DnType::CommonName, "vaultcert Test CA");
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let ca_cert = ca_params.self_signed(&ca_key).context("self-sign CA")?;

        let client_key = KeyPair::generate().context("generate client key")?;
        let mut client_params =
            CertificateParams::new(vec!["client.local".to_string()]).context("client params")?;
        client_params.distinguished_name.push(DnType::CommonName, "client.local");
        let client_cert =
            client_params.signed_by(&client_key, &ca_cert, &ca_key).context("sign client")?;

        let temp_dir = TempDir::new().context("create temp dir")?;
        let ca_path = temp_dir.path().join("ca.pem");
        let client_cert_path = temp_dir.path().join("client.pem");
        let client_key_path = temp_dir.path().join("client-key.pem");

        let ca_pem = ca_cert.pem();
        let client_cert_pem = client_cert.pem();
        let client_key_pem = client_key.serialize_pem();

        fs::write(&ca_path, &ca_pem).context("write CA")?;
        fs::write(&client_cert_path, &client_cert_pem).context("write client certificate")?;
        fs::write(&client_key_path, &client_key_pem).context("write client key")?;

        Ok(Self {
            temp_dir,
            ca_pem,
            client_cert_pem,
            client_key_pem,
            ca_path,
            client_cert_path,
            client_key_path,
        })
    }

    /// The client certificate and key, by path.
    pub fn client_identity(&self) -> ClientCertificate {
        ClientCertificate::new(
            PemSource::path(&self.client_cert_path),
            PemSource::path(&self.client_key_path),
        )
    }

    /// Write arbitrary content next to the generated files.
    pub fn write_file(&self, name: &str, contents: &str) -> anyhow::Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).with_context(|| format!("write {}", name))?;
        Ok(path)
    }
}

/// A PEM CRL signed by an unrelated test CA.
pub fn crl_fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/test.crl.pem")
}
