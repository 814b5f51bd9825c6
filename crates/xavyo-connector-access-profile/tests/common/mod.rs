//! Shared helpers for Access Profile connector integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate, Times};

use xavyo_connector_access_profile::{AccessProfileClient, AccessProfileConfig, RetryPolicy};

pub const TOKEN: &str = "test-token-123";
pub const TOKEN_PATH: &str = "/oauth/token";

/// Configuration pointing at the mock server, with zero backoff so retry
/// tests run instantly.
pub fn config(server: &MockServer, max_retries: u32) -> AccessProfileConfig {
    AccessProfileConfig::new(
        server.uri(),
        "client-id",
        "client-secret",
        format!("{}{}", server.uri(), TOKEN_PATH),
    )
    .unwrap()
    .with_retry(RetryPolicy::new(max_retries, Duration::ZERO))
}

/// Client for the mock server with the default retry ceiling.
pub fn client(server: &MockServer) -> AccessProfileClient {
    AccessProfileClient::with_http_client(&config(server, 10), reqwest::Client::new())
}

/// Mount a token endpoint that expects `times` token requests.
pub async fn mock_token(server: &MockServer, times: impl Into<Times>) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": TOKEN,
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(times)
        .mount(server)
        .await;
}

pub fn profile_path(id: &str) -> String {
    format!("/v3/access-profiles/{id}")
}

pub fn entitlement(id: &str) -> Value {
    json!({
        "id": id,
        "type": "ENTITLEMENT",
        "name": format!("CN={id},OU=Groups"),
        "source": { "id": "src-ad", "type": "SOURCE", "name": "Active Directory" }
    })
}

pub fn access_profile(id: &str, entitlement_ids: &[&str]) -> Value {
    json!({
        "id": id,
        "name": "Finance Analysts",
        "enabled": true,
        "requestable": true,
        "owner": { "type": "IDENTITY", "id": "owner-1", "name": "Jane Doe" },
        "entitlements": entitlement_ids.iter().map(|e| entitlement(e)).collect::<Vec<_>>()
    })
}
