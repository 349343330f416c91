//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod certs;
pub mod fake_vault;

pub use certs::{crl_fixture, TestCertificateFiles};
pub use fake_vault::{FakeVault, ROOT_TOKEN};

use vaultcert::{ClientConfig, EnableAuthMethod, TlsConfig, VaultClient};

/// Mount point used by the cert auth tests.
pub const TEST_MOUNT_POINT: &str = "cert-test";

/// Role name used by the cert auth tests.
pub const TEST_ROLE_NAME: &str = "testrole";

/// Client for the fake server authenticated with the root token.
pub fn root_client(vault: &FakeVault) -> VaultClient {
    VaultClient::new(ClientConfig::new(vault.address()).with_token(ROOT_TOKEN))
        .expect("client for fake server")
}

/// Root client whose configured identity is the generated client certificate.
pub fn client_with_identity(vault: &FakeVault, certs: &TestCertificateFiles) -> VaultClient {
    let tls = TlsConfig { client_cert: Some(certs.client_identity()), ..Default::default() };
    VaultClient::new(ClientConfig::new(vault.address()).with_token(ROOT_TOKEN).with_tls(tls))
        .expect("client for fake server")
}

/// Mount the cert auth method at [`TEST_MOUNT_POINT`].
pub async fn enable_cert_mount(client: &VaultClient) {
    let status = client
        .sys()
        .enable_auth_method("cert", TEST_MOUNT_POINT, &EnableAuthMethod::default())
        .await
        .expect("enable cert auth method");
    assert_eq!(status, 204);
}
