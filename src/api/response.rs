//! Response envelope types shared by every endpoint.

use std::collections::HashMap;

use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::errors::{Result, VaultError};

/// A successful HTTP exchange before decoding.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub url: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|source| VaultError::Decode { url: self.url.clone(), source })
    }
}

/// The standard response envelope returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub lease_id: String,
    #[serde(default)]
    pub renewable: bool,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub wrap_info: Option<serde_json::Value>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    #[serde(default)]
    pub auth: Option<AuthInfo>,
}

impl<T> ApiResponse<T> {
    /// The `data` payload, or an error naming the request if it was absent.
    pub fn into_data(self) -> Result<T> {
        let request_id = self.request_id;
        self.data.ok_or(VaultError::MissingData { request_id })
    }
}

/// Token information returned by a login.
#[derive(Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AuthInfo {
    pub client_token: String,
    #[serde(default)]
    pub accessor: String,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub token_policies: Vec<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
    #[serde(default)]
    pub entity_id: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub orphan: bool,
}

impl std::fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInfo")
            .field("client_token", &"[REDACTED]")
            .field("accessor", &self.accessor)
            .field("policies", &self.policies)
            .field("token_policies", &self.token_policies)
            .field("metadata", &self.metadata)
            .field("lease_duration", &self.lease_duration)
            .field("renewable", &self.renewable)
            .field("entity_id", &self.entity_id)
            .field("token_type", &self.token_type)
            .field("orphan", &self.orphan)
            .finish()
    }
}

/// Payload of a `LIST` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ListKeys {
    #[serde(default)]
    pub keys: Vec<String>,
}
