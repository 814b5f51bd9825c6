//! Integration tests for the Access Profiles HTTP client: auth, retry on rate
//! limits, and failure absorption.

mod common;

use common::{access_profile, client, config, mock_token, profile_path, TOKEN};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xavyo_connector_access_profile::{
    AccessProfileClient, AccessProfileError, EntitlementRef, JsonPatchOperation,
};

// ═══════════════════════════════════════════════════════════════════════════
// Reads
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_fetch_entitlements_success() {
    let server = MockServer::start().await;
    mock_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(profile_path("ap-1")))
        .and(header("Authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(access_profile("ap-1", &["A", "B", "C"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let entitlements = client(&server).fetch_entitlements("ap-1").await.unwrap();

    let ids: Vec<&str> = entitlements.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
    assert_eq!(entitlements[0].ref_type.as_deref(), Some("ENTITLEMENT"));
    assert!(entitlements[0].extra.contains_key("source"));
}

#[tokio::test]
async fn test_token_is_cached_across_requests() {
    let server = MockServer::start().await;
    mock_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(profile_path("ap-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(access_profile("ap-1", &["A"])))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.fetch_entitlements("ap-1").await.is_some());
    assert!(client.fetch_entitlements("ap-1").await.is_some());
}

#[tokio::test]
async fn test_fetch_entitlements_absent_field() {
    let server = MockServer::start().await;
    mock_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(profile_path("ap-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ap-1",
            "name": "Empty",
            "enabled": false
        })))
        .mount(&server)
        .await;

    assert!(client(&server).fetch_entitlements("ap-1").await.is_none());
}

#[tokio::test]
async fn test_fetch_entitlements_not_found() {
    let server = MockServer::start().await;
    mock_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(profile_path("missing")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "detailCode": "404 Not found",
            "messages": [{ "text": "The Access Profile was not found." }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    match client.get_access_profile("missing").await {
        Err(AccessProfileError::NotFound(body)) => assert!(body.contains("not found")),
        other => panic!("Expected NotFound, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_entitlements_token_failure_is_absent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(matches!(
        client.get_access_profile("ap-1").await,
        Err(AccessProfileError::Auth(_))
    ));
    assert!(client.fetch_entitlements("ap-1").await.is_none());
}

#[tokio::test]
async fn test_unauthorized_invalidates_cached_token() {
    let server = MockServer::start().await;
    mock_token(&server, 2).await;

    Mock::given(method("GET"))
        .and(path(profile_path("ap-1")))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(profile_path("ap-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(access_profile("ap-1", &["A"])))
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(matches!(
        client.get_access_profile("ap-1").await,
        Err(AccessProfileError::Auth(_))
    ));
    assert!(client.get_access_profile("ap-1").await.is_ok());
}

// ═══════════════════════════════════════════════════════════════════════════
// Retry behaviour
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_rate_limited_then_success() {
    let server = MockServer::start().await;
    mock_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(profile_path("ap-1")))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(profile_path("ap-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(access_profile("ap-1", &["A"])))
        .expect(1)
        .mount(&server)
        .await;

    let profile = client(&server).get_access_profile("ap-1").await.unwrap();
    assert_eq!(profile.id, "ap-1");
}

#[tokio::test]
async fn test_rate_limited_up_to_retry_ceiling_succeeds() {
    let server = MockServer::start().await;
    mock_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(profile_path("ap-1")))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(10)
        .expect(10)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(profile_path("ap-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(access_profile("ap-1", &["A"])))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client(&server).fetch_entitlements("ap-1").await.is_some());
}

#[tokio::test]
async fn test_rate_limit_retries_exhausted() {
    let server = MockServer::start().await;
    mock_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(profile_path("ap-1")))
        .respond_with(ResponseTemplate::new(429))
        .expect(6) // two calls, 1 initial + 2 retries each
        .mount(&server)
        .await;

    let client = AccessProfileClient::with_http_client(&config(&server, 2), reqwest::Client::new());
    match client.get_access_profile("ap-1").await {
        Err(AccessProfileError::MaxRetriesExceeded { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("Expected MaxRetriesExceeded, got: {other:?}"),
    }
    assert!(client.fetch_entitlements("ap-1").await.is_none());
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;
    mock_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(profile_path("ap-1")))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    match client.get_access_profile("ap-1").await {
        Err(AccessProfileError::Api { status, detail }) => {
            assert_eq!(status, 500);
            assert_eq!(detail, "internal error");
        }
        other => panic!("Expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_fetch_is_absent() {
    let server = MockServer::start().await;
    mock_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(profile_path("ap-1")))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client(&server).fetch_entitlements("ap-1").await.is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// Patches
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_apply_patch_sends_json_patch_body() {
    let server = MockServer::start().await;
    mock_token(&server, 1).await;

    let remaining = vec![EntitlementRef::new("D", "CN=D")];
    let actions = vec![JsonPatchOperation::replace_entitlements(&remaining).unwrap()];

    Mock::given(method("PATCH"))
        .and(path(profile_path("ap-1")))
        .and(header("Content-Type", "application/json-patch+json"))
        .and(header("Authorization", format!("Bearer {TOKEN}").as_str()))
        .and(body_json(json!([{
            "op": "replace",
            "path": "/entitlements",
            "value": [{ "id": "D", "type": "ENTITLEMENT", "name": "CN=D" }]
        }])))
        .respond_with(ResponseTemplate::new(200).set_body_json(access_profile("ap-1", &["D"])))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client(&server).apply_patch("ap-1", &actions).await.unwrap();
    assert_eq!(updated.entitlements.unwrap().len(), 1);
}

#[tokio::test]
async fn test_apply_patch_disable() {
    let server = MockServer::start().await;
    mock_token(&server, 1).await;

    let mut disabled = access_profile("ap-1", &["A"]);
    disabled["enabled"] = json!(false);

    Mock::given(method("PATCH"))
        .and(path(profile_path("ap-1")))
        .and(body_json(json!([{ "op": "replace", "path": "/enabled", "value": "false" }])))
        .respond_with(ResponseTemplate::new(200).set_body_json(disabled))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client(&server)
        .apply_patch("ap-1", &[JsonPatchOperation::disable()])
        .await
        .unwrap();
    assert_eq!(updated.enabled, Some(false));
}

#[tokio::test]
async fn test_apply_patch_rejected_is_absent() {
    let server = MockServer::start().await;
    mock_token(&server, 1).await;

    Mock::given(method("PATCH"))
        .and(path(profile_path("ap-1")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detailCode": "400.1 Bad Request Content",
            "messages": [{ "text": "entitlements must not be empty" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .apply_patch("ap-1", &[JsonPatchOperation::replace_entitlements(&[]).unwrap()])
        .await;
    assert!(result.is_none());
}
