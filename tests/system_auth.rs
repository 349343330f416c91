//! Auth method mount tests against the fake server.

mod common;

use std::time::Duration;

use common::{enable_cert_mount, root_client, FakeVault, TEST_MOUNT_POINT};
use vaultcert::{ClientConfig, EnableAuthMethod, VaultClient, VaultError};

#[tokio::test]
async fn test_enable_and_list_auth_methods() {
    let vault = FakeVault::start().await;
    let client = root_client(&vault);

    let mounts = client.sys().list_auth_methods().await.unwrap().into_data().unwrap();
    assert!(!mounts.contains_key("cert-test/"));
    assert_eq!(mounts["token/"].method_type, "token");

    enable_cert_mount(&client).await;

    let mounts = client.sys().list_auth_methods().await.unwrap().into_data().unwrap();
    assert_eq!(mounts["cert-test/"].method_type, "cert");
    assert!(vault.is_mounted(TEST_MOUNT_POINT));
    assert!(client.sys().is_auth_method_enabled("/cert-test/").await.unwrap());
}

#[tokio::test]
async fn test_enable_sends_type_and_description() {
    let vault = FakeVault::start().await;
    let client = root_client(&vault);

    let options =
        EnableAuthMethod { description: Some("mTLS logins".to_string()), ..Default::default() };
    client.sys().enable_auth_method("cert", "team/cert", &options).await.unwrap();

    let requests = vault.server.received_requests().await.unwrap();
    let request = requests.last().unwrap();
    assert_eq!(request.url.path(), "/v1/sys/auth/team/cert");
    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body, serde_json::json!({ "type": "cert", "description": "mTLS logins" }));

    let mounts = client.sys().list_auth_methods().await.unwrap().into_data().unwrap();
    assert_eq!(mounts["team/cert/"].description, "mTLS logins");
}

#[tokio::test]
async fn test_enable_twice_is_invalid_request() {
    let vault = FakeVault::start().await;
    let client = root_client(&vault);
    enable_cert_mount(&client).await;

    let err = client
        .sys()
        .enable_auth_method("cert", TEST_MOUNT_POINT, &EnableAuthMethod::default())
        .await
        .expect_err("already mounted");

    assert!(matches!(err, VaultError::InvalidRequest(_)));
    assert!(err.to_string().contains("path is already in use"));
}

#[tokio::test]
async fn test_disable_auth_method() {
    let vault = FakeVault::start().await;
    let client = root_client(&vault);
    enable_cert_mount(&client).await;

    let status = client.sys().disable_auth_method(TEST_MOUNT_POINT).await.unwrap();
    assert_eq!(status, 204);
    assert!(!client.sys().is_auth_method_enabled(TEST_MOUNT_POINT).await.unwrap());
}

#[tokio::test]
async fn test_read_auth_method_tuning() {
    let vault = FakeVault::start().await;
    let client = root_client(&vault);
    enable_cert_mount(&client).await;

    let tuning = client
        .sys()
        .read_auth_method_tuning(TEST_MOUNT_POINT)
        .await
        .unwrap()
        .into_data()
        .unwrap();
    assert_eq!(tuning.default_lease_ttl, 2764800);
    assert_eq!(tuning.token_type.as_deref(), Some("default-service"));

    let err = client.sys().read_auth_method_tuning("missing").await.expect_err("not mounted");
    assert!(matches!(err, VaultError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_invalid_mount_path_is_rejected_locally() {
    let vault = FakeVault::start().await;
    let client = root_client(&vault);

    for path in ["", "/", "cert/../sys", "cert?x=1"] {
        let err = client
            .sys()
            .enable_auth_method("cert", path, &EnableAuthMethod::default())
            .await
            .expect_err("invalid path");
        assert!(matches!(err, VaultError::ParamValidation(_)), "path {path:?}: {err:?}");
    }

    assert_eq!(vault.request_count().await, 0);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    // Reserve a free port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = VaultClient::new(
        ClientConfig::new(address)
            .with_token(common::ROOT_TOKEN)
            .with_timeout(Duration::from_secs(2)),
    )
    .unwrap();

    let err = client.sys().list_auth_methods().await.expect_err("nothing is listening");
    assert!(matches!(err, VaultError::Transport(_)));
    assert!(!err.is_local());
    assert!(err.status().is_none());
}
