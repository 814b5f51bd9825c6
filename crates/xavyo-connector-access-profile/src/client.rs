//! Access Profiles API HTTP client (reqwest-based).
//!
//! Two layers are exposed. `get_access_profile` and `patch_access_profile`
//! return typed errors. `fetch_entitlements` and `apply_patch` are the
//! boundary used by the reconciliation hook: they never fail, every error is
//! logged and turned into `None`.

use crate::auth::TokenCache;
use crate::config::AccessProfileConfig;
use crate::error::{AccessProfileError, AccessProfileResult};
use crate::model::{AccessProfile, EntitlementRef, JsonPatchOperation};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

/// Content type required by the API for JSON Patch bodies.
const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

/// Marker attached to the debug-level record of a failed request.
const FAILED_REQUEST_MARKER: &str = "Failed Access Profiles API request";

/// The operations the reconciliation hook needs from the remote API.
///
/// Implementations absorb every failure and report it as `None`.
#[async_trait]
pub trait AccessProfileApi: Send + Sync {
    /// Current entitlements of the Access Profile, or `None` if the profile
    /// has no entitlement list or could not be read.
    async fn fetch_entitlements(&self, id: &str) -> Option<Vec<EntitlementRef>>;

    /// Apply JSON Patch operations, returning the updated profile or `None`
    /// on failure.
    async fn apply_patch(
        &self,
        id: &str,
        actions: &[JsonPatchOperation],
    ) -> Option<AccessProfile>;
}

/// HTTP client for the Access Profiles endpoints.
#[derive(Debug, Clone)]
pub struct AccessProfileClient {
    base_url: String,
    auth: TokenCache,
    http_client: Client,
    retry: RetryPolicy,
}

impl AccessProfileClient {
    /// Create a client from configuration.
    pub fn new(config: &AccessProfileConfig) -> AccessProfileResult<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent("xavyo-connector-access-profile/1.0")
            .build()
            .map_err(|e| {
                AccessProfileError::Config(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self::with_http_client(config, http_client))
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(config: &AccessProfileConfig, http_client: Client) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth: TokenCache::new(config, http_client.clone()),
            http_client,
            retry: config.retry.clone(),
        }
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /v3/access-profiles/{id}`.
    pub async fn get_access_profile(&self, id: &str) -> AccessProfileResult<AccessProfile> {
        let target = self.profile_url(id)?;
        let url = target.as_str();
        self.retry
            .execute(url, move || async move {
                debug!("GET {}", url);
                let builder = self.auth.apply(self.http_client.get(url)).await?;
                let response = builder.send().await?;
                self.handle_response(response).await
            })
            .await
    }

    /// `PATCH /v3/access-profiles/{id}` with a JSON Patch body.
    pub async fn patch_access_profile(
        &self,
        id: &str,
        actions: &[JsonPatchOperation],
    ) -> AccessProfileResult<AccessProfile> {
        let target = self.profile_url(id)?;
        let url = target.as_str();
        let body = serde_json::to_vec(actions)?;
        let body = body.as_slice();
        self.retry
            .execute(url, move || async move {
                debug!("PATCH {}", url);
                let builder = self.auth.apply(self.http_client.patch(url)).await?;
                let response = builder
                    .header(reqwest::header::CONTENT_TYPE, JSON_PATCH_CONTENT_TYPE)
                    .body(body.to_vec())
                    .send()
                    .await?;
                self.handle_response(response).await
            })
            .await
    }

    /// Current entitlements of an Access Profile; `None` on any failure or
    /// when the profile carries no entitlement list.
    pub async fn fetch_entitlements(&self, id: &str) -> Option<Vec<EntitlementRef>> {
        match self.get_access_profile(id).await {
            Ok(profile) => profile.entitlements,
            Err(e) => {
                log_failure(&format!("Error fetching Access Profile {id}"), &e);
                None
            }
        }
    }

    /// Apply a patch to an Access Profile; `None` on any failure.
    pub async fn apply_patch(
        &self,
        id: &str,
        actions: &[JsonPatchOperation],
    ) -> Option<AccessProfile> {
        match self.patch_access_profile(id, actions).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                log_failure(&format!("Error patching Access Profile {id}"), &e);
                None
            }
        }
    }

    fn profile_url(&self, id: &str) -> AccessProfileResult<String> {
        let mut url = url::Url::parse(&self.base_url)
            .map_err(|e| AccessProfileError::Config(format!("Invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| AccessProfileError::Config("Base URL cannot carry path segments".to_string()))?
            .pop_if_empty()
            .extend(["v3", "access-profiles", id]);
        Ok(url.into())
    }

    // ── Response Handling ─────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> AccessProfileResult<T> {
        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            return Ok(serde_json::from_str(&body)?);
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());

        match status {
            StatusCode::NOT_FOUND => Err(AccessProfileError::NotFound(body)),
            StatusCode::TOO_MANY_REQUESTS => Err(AccessProfileError::RateLimited {
                retry_after_secs: retry_after,
            }),
            StatusCode::UNAUTHORIZED => {
                self.auth.invalidate().await;
                Err(AccessProfileError::Auth(format!(
                    "Authentication failed (401): {body}"
                )))
            }
            _ => {
                let detail = if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                };
                Err(AccessProfileError::Api {
                    status: status.as_u16(),
                    detail,
                })
            }
        }
    }
}

fn log_failure(context: &str, e: &AccessProfileError) {
    error!("{context} using Access Profiles API: {e}");
    debug!(error = ?e, "{FAILED_REQUEST_MARKER}");
}

#[async_trait]
impl AccessProfileApi for AccessProfileClient {
    async fn fetch_entitlements(&self, id: &str) -> Option<Vec<EntitlementRef>> {
        AccessProfileClient::fetch_entitlements(self, id).await
    }

    async fn apply_patch(
        &self,
        id: &str,
        actions: &[JsonPatchOperation],
    ) -> Option<AccessProfile> {
        AccessProfileClient::apply_patch(self, id, actions).await
    }
}
