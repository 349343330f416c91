//! Stateful wiremock stand-in for the secrets server HTTP API.
//!
//! Covers the sys/auth mount endpoints and the cert auth method (roles,
//! config, CRLs and login). Requests other than login require the root token
//! or a token issued by a login.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use wiremock::matchers::path_regex;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const ROOT_TOKEN: &str = "root-token";

#[derive(Debug, Clone)]
struct Mount {
    method_type: String,
    description: String,
    accessor: String,
}

#[derive(Debug, Default)]
struct CertBackend {
    roles: BTreeMap<String, Value>,
    crls: BTreeMap<String, String>,
    config: Value,
}

#[derive(Debug)]
struct State {
    mounts: BTreeMap<String, Mount>,
    cert_backends: BTreeMap<String, CertBackend>,
    tokens: HashSet<String>,
    issued: u64,
}

impl Default for State {
    fn default() -> Self {
        let mut mounts = BTreeMap::new();
        mounts.insert(
            "token".to_string(),
            Mount {
                method_type: "token".to_string(),
                description: "token based credentials".to_string(),
                accessor: "auth_token_0001".to_string(),
            },
        );

        Self {
            mounts,
            cert_backends: BTreeMap::new(),
            tokens: HashSet::from([ROOT_TOKEN.to_string()]),
            issued: 0,
        }
    }
}

/// Running fake server. Dropping it shuts the server down.
pub struct FakeVault {
    pub server: MockServer,
    state: Arc<Mutex<State>>,
}

impl FakeVault {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let state = Arc::new(Mutex::new(State::default()));

        let handler_state = state.clone();
        Mock::given(path_regex(r"^/v1/.*"))
            .respond_with(move |req: &Request| {
                let mut state = handler_state.lock().unwrap();
                state.handle(req)
            })
            .mount(&server)
            .await;

        Self { server, state }
    }

    pub fn address(&self) -> String {
        self.server.uri()
    }

    /// Number of requests the server has received.
    pub async fn request_count(&self) -> usize {
        self.server.received_requests().await.map(|r| r.len()).unwrap_or(0)
    }

    /// Methods and paths of every received request, in order.
    pub async fn requests(&self) -> Vec<(String, String)> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| (r.method.to_string(), r.url.path().to_string()))
            .collect()
    }

    pub fn is_mounted(&self, path: &str) -> bool {
        self.state.lock().unwrap().mounts.contains_key(path.trim_matches('/'))
    }

    /// Stored configuration of a cert mount.
    pub fn cert_config(&self, mount: &str) -> Option<Value> {
        self.state.lock().unwrap().cert_backends.get(mount).map(|b| b.config.clone())
    }
}

fn error(status: u16, errors: &[&str]) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "errors": errors }))
}

fn no_content() -> ResponseTemplate {
    ResponseTemplate::new(204)
}

fn data(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "request_id": "00000000-0000-0000-0000-000000000000",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 0,
        "data": data,
        "wrap_info": null,
        "warnings": null,
        "auth": null
    }))
}

/// Seconds from `3600`, `"3600"`, `"60s"`, `"5m"` or `"1h"`.
fn seconds(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => {
            let (digits, unit) = s.split_at(s.trim_end_matches(|c: char| c.is_alphabetic()).len());
            let n: u64 = digits.parse().unwrap_or(0);
            match unit {
                "m" => n * 60,
                "h" => n * 3600,
                _ => n,
            }
        }
        _ => 0,
    }
}

fn string_list(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Array(items)) => Value::Array(items.clone()),
        Some(Value::String(s)) if !s.is_empty() => {
            Value::Array(s.split(',').map(|p| Value::String(p.trim().to_string())).collect())
        }
        _ => Value::Array(Vec::new()),
    }
}

impl State {
    fn handle(&mut self, req: &Request) -> ResponseTemplate {
        let method = req.method.to_string();
        let path = req.url.path().trim_start_matches("/v1/").trim_end_matches('/').to_string();
        let body: Value = serde_json::from_slice(&req.body).unwrap_or(Value::Null);

        let token = req.headers.get("X-Vault-Token").and_then(|v| v.to_str().ok());
        let is_login = method == "POST" && path.starts_with("auth/") && path.ends_with("/login");
        if !is_login && !token.is_some_and(|t| self.tokens.contains(t)) {
            return error(403, &["permission denied"]);
        }

        if path == "sys/auth" {
            return match method.as_str() {
                "GET" => self.list_mounts(),
                _ => error(405, &["unsupported operation"]),
            };
        }

        if let Some(rest) = path.strip_prefix("sys/auth/") {
            if let Some(mount) = rest.strip_suffix("/tune") {
                return self.read_tuning(mount);
            }
            return match method.as_str() {
                "POST" => self.enable(rest, &body),
                "DELETE" => self.disable(rest),
                _ => error(405, &["unsupported operation"]),
            };
        }

        if let Some(rest) = path.strip_prefix("auth/") {
            return self.cert_route(&method, rest, &body);
        }

        error(404, &["no handler for route"])
    }

    fn list_mounts(&self) -> ResponseTemplate {
        let mounts: serde_json::Map<String, Value> = self
            .mounts
            .iter()
            .map(|(path, mount)| {
                (
                    format!("{}/", path),
                    json!({
                        "type": mount.method_type,
                        "description": mount.description,
                        "accessor": mount.accessor,
                        "config": { "default_lease_ttl": 0, "max_lease_ttl": 0 },
                        "local": false,
                        "seal_wrap": false
                    }),
                )
            })
            .collect();
        data(Value::Object(mounts))
    }

    fn read_tuning(&self, mount: &str) -> ResponseTemplate {
        match self.mounts.get(mount) {
            Some(m) => data(json!({
                "default_lease_ttl": 2764800,
                "max_lease_ttl": 2764800,
                "force_no_cache": false,
                "description": m.description,
                "token_type": "default-service"
            })),
            None => {
                let message = format!("cannot fetch sysview for path \"auth/{}/\"", mount);
                error(400, &[message.as_str()])
            }
        }
    }

    fn enable(&mut self, mount: &str, body: &Value) -> ResponseTemplate {
        if self.mounts.contains_key(mount) {
            return error(400, &[format!("path is already in use at {}/", mount).as_str()]);
        }

        let method_type = body["type"].as_str().unwrap_or_default().to_string();
        if method_type.is_empty() {
            return error(400, &["missing 'type' parameter"]);
        }

        if method_type == "cert" {
            self.cert_backends.insert(mount.to_string(), CertBackend::default());
        }
        self.mounts.insert(
            mount.to_string(),
            Mount {
                method_type,
                description: body["description"].as_str().unwrap_or_default().to_string(),
                accessor: format!("auth_{}_{:04}", mount.replace('/', "_"), self.mounts.len()),
            },
        );
        no_content()
    }

    fn disable(&mut self, mount: &str) -> ResponseTemplate {
        self.mounts.remove(mount);
        self.cert_backends.remove(mount);
        no_content()
    }

    fn cert_route(&mut self, method: &str, rest: &str, body: &Value) -> ResponseTemplate {
        // Longest mount prefix wins so nested mounts resolve.
        let Some(mount) = self
            .cert_backends
            .keys()
            .filter(|m| rest == m.as_str() || rest.starts_with(&format!("{}/", m)))
            .max_by_key(|m| m.len())
            .cloned()
        else {
            return error(404, &[format!("no handler for route \"auth/{}\"", rest).as_str()]);
        };

        let sub = rest[mount.len()..].trim_start_matches('/').to_string();
        let (resource, name) = match sub.split_once('/') {
            Some((resource, name)) => (resource.to_string(), Some(name.to_string())),
            None => (sub.clone(), None),
        };

        match (method, resource.as_str(), name) {
            ("POST", "certs", Some(name)) => self.write_role(&mount, &name, body),
            ("GET", "certs", Some(name)) => self.read_role(&mount, &name),
            ("DELETE", "certs", Some(name)) => {
                self.backend(&mount).roles.remove(&name);
                no_content()
            }
            ("LIST", "certs", None) => {
                let keys: Vec<String> = self.backend(&mount).roles.keys().cloned().collect();
                if keys.is_empty() {
                    error(404, &[])
                } else {
                    data(json!({ "keys": keys }))
                }
            }
            ("POST", "config", None) => {
                self.backend(&mount).config = body.clone();
                no_content()
            }
            ("POST", "crls", Some(name)) => match body["crl"].as_str() {
                Some(crl) if crl.contains("BEGIN X509 CRL") => {
                    self.backend(&mount).crls.insert(name, crl.to_string());
                    no_content()
                }
                _ => error(400, &["failed to parse CRL"]),
            },
            ("GET", "crls", Some(name)) => match self.backend(&mount).crls.get(&name) {
                Some(_) => data(json!({ "serials": {} })),
                None => error(404, &[]),
            },
            ("DELETE", "crls", Some(name)) => {
                self.backend(&mount).crls.remove(&name);
                no_content()
            }
            ("POST", "login", None) => self.login(&mount, body),
            _ => error(405, &["unsupported operation"]),
        }
    }

    fn backend(&mut self, mount: &str) -> &mut CertBackend {
        self.cert_backends.entry(mount.to_string()).or_default()
    }

    fn write_role(&mut self, mount: &str, name: &str, body: &Value) -> ResponseTemplate {
        let certificate = body["certificate"].as_str().unwrap_or_default();
        if !certificate.contains("BEGIN CERTIFICATE") {
            return error(400, &["failed to parse certificate"]);
        }

        let display_name = body["display_name"].as_str().unwrap_or(name).to_string();
        let role = json!({
            "certificate": certificate,
            "display_name": display_name,
            "allowed_common_names": string_list(body.get("allowed_common_names")),
            "allowed_dns_sans": string_list(body.get("allowed_dns_sans")),
            "allowed_email_sans": string_list(body.get("allowed_email_sans")),
            "allowed_uri_sans": string_list(body.get("allowed_uri_sans")),
            "allowed_organizational_units": string_list(body.get("allowed_organizational_units")),
            "required_extensions": string_list(body.get("required_extensions")),
            "token_policies": string_list(body.get("token_policies")),
            "token_bound_cidrs": string_list(body.get("token_bound_cidrs")),
            "token_ttl": seconds(body.get("token_ttl")),
            "token_max_ttl": seconds(body.get("token_max_ttl")),
            "token_explicit_max_ttl": seconds(body.get("token_explicit_max_ttl")),
            "token_period": seconds(body.get("token_period")),
            "token_no_default_policy": body["token_no_default_policy"].as_bool().unwrap_or(false),
            "token_num_uses": body["token_num_uses"].as_u64().unwrap_or(0),
            "token_type": body["token_type"].as_str().unwrap_or("default")
        });

        self.backend(mount).roles.insert(name.to_string(), role);
        no_content()
    }

    fn read_role(&mut self, mount: &str, name: &str) -> ResponseTemplate {
        match self.backend(mount).roles.get(name) {
            Some(role) => data(role.clone()),
            None => error(404, &[]),
        }
    }

    fn login(&mut self, mount: &str, body: &Value) -> ResponseTemplate {
        let requested = body["name"].as_str().filter(|n| !n.is_empty());
        let role = match requested {
            Some(name) => {
                self.backend(mount).roles.get(name).map(|r| (name.to_string(), r.clone()))
            }
            None => {
                self.backend(mount).roles.iter().next().map(|(n, r)| (n.clone(), r.clone()))
            }
        };

        let Some((name, role)) = role else {
            return error(400, &["invalid certificate or no client certificate supplied"]);
        };

        self.issued += 1;
        let token = format!("hvs.cert-{:04}", self.issued);
        self.tokens.insert(token.clone());

        let mut policies = vec![Value::String("default".to_string())];
        if let Value::Array(extra) = &role["token_policies"] {
            policies.extend(extra.iter().cloned());
        }
        let lease_duration = match role["token_ttl"].as_u64() {
            Some(0) | None => 2764800,
            Some(ttl) => ttl,
        };

        ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "11111111-1111-1111-1111-111111111111",
            "lease_id": "",
            "renewable": false,
            "lease_duration": 0,
            "data": null,
            "wrap_info": null,
            "warnings": null,
            "auth": {
                "client_token": token,
                "accessor": format!("accessor-{:04}", self.issued),
                "policies": policies,
                "token_policies": policies,
                "metadata": {
                    "authority_key_id": "",
                    "cert_name": name,
                    "common_name": "client.local",
                    "serial_number": "1",
                    "subject_key_id": ""
                },
                "lease_duration": lease_duration,
                "renewable": true,
                "entity_id": "00000000-0000-0000-0000-00000000e1d1",
                "token_type": "service",
                "orphan": true
            }
        }))
    }
}
