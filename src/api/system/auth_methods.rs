//! Enabling, disabling and listing auth methods.

use std::{collections::BTreeMap, sync::Arc};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    adapter::{Adapter, VaultRequest},
    api::{mount_segment, response::ApiResponse},
    errors::Result,
};

/// Options for mounting an auth method.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnableAuthMethod {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tuning options (`default_lease_ttl`, `max_lease_ttl`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_name: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub local: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub seal_wrap: bool,
}

#[derive(Serialize)]
struct EnableBody<'a> {
    #[serde(rename = "type")]
    method_type: &'a str,
    #[serde(flatten)]
    options: &'a EnableAuthMethod,
}

/// A mounted auth method as reported by `GET /v1/sys/auth`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AuthMount {
    #[serde(rename = "type", default)]
    pub method_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub accessor: String,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub seal_wrap: bool,
}

/// Tuning parameters of a mounted auth method.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AuthMethodTuning {
    #[serde(default)]
    pub default_lease_ttl: u64,
    #[serde(default)]
    pub max_lease_ttl: u64,
    #[serde(default)]
    pub force_no_cache: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Auth method management under `/v1/sys/auth`.
#[derive(Clone)]
pub struct AuthMethods {
    adapter: Arc<dyn Adapter>,
}

impl AuthMethods {
    pub fn new(adapter: Arc<dyn Adapter>) -> Self {
        Self { adapter }
    }

    /// Mount an auth method of `method_type` at `path`. Returns `204` on success.
    pub async fn enable_auth_method(
        &self,
        method_type: &str,
        path: &str,
        options: &EnableAuthMethod,
    ) -> Result<StatusCode> {
        let path = mount_segment(path)?;
        let body = serde_json::to_value(EnableBody { method_type, options })?;

        let response = self
            .adapter
            .send(VaultRequest::post(format!("/v1/sys/auth/{}", path)).with_body(body))
            .await?;

        info!(method_type = %method_type, path = %path, "Auth method enabled");
        Ok(response.status)
    }

    /// Unmount the auth method at `path`. Returns `204` on success.
    pub async fn disable_auth_method(&self, path: &str) -> Result<StatusCode> {
        let path = mount_segment(path)?;
        let response =
            self.adapter.send(VaultRequest::delete(format!("/v1/sys/auth/{}", path))).await?;

        info!(path = %path, "Auth method disabled");
        Ok(response.status)
    }

    /// List mounted auth methods, keyed by path with a trailing slash (`cert/`).
    pub async fn list_auth_methods(&self) -> Result<ApiResponse<BTreeMap<String, AuthMount>>> {
        self.adapter.send(VaultRequest::get("/v1/sys/auth")).await?.json()
    }

    /// Read the tuning parameters of the auth method at `path`.
    pub async fn read_auth_method_tuning(
        &self,
        path: &str,
    ) -> Result<ApiResponse<AuthMethodTuning>> {
        let path = mount_segment(path)?;
        self.adapter.send(VaultRequest::get(format!("/v1/sys/auth/{}/tune", path))).await?.json()
    }

    /// Whether an auth method is mounted at `path`.
    pub async fn is_auth_method_enabled(&self, path: &str) -> Result<bool> {
        let key = format!("{}/", mount_segment(path)?);
        let mounts = self.list_auth_methods().await?;
        Ok(mounts.data.map(|data| data.contains_key(&key)).unwrap_or(false))
    }
}
