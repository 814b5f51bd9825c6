//! `OAuth2` client-credentials authentication for the Access Profiles API.

use crate::config::AccessProfileConfig;
use crate::error::{AccessProfileError, AccessProfileResult};
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Tokens are refreshed this long before their advertised expiry.
const EXPIRY_MARGIN_SECS: u64 = 30;

/// `OAuth2` token response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Cached access token with expiry.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(exp) => Instant::now() >= exp,
            None => false,
        }
    }
}

/// Bearer token provider backed by the client-credentials grant.
///
/// Clones share the same token cache.
#[derive(Debug, Clone)]
pub struct TokenCache {
    token_url: String,
    client_id: String,
    client_secret: Arc<SecretString>,
    http_client: reqwest::Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl TokenCache {
    /// Create a token cache for the configured client.
    pub fn new(config: &AccessProfileConfig, http_client: reqwest::Client) -> Self {
        Self {
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: Arc::new(SecretString::from(config.expose_client_secret())),
            http_client,
            cached_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Get a valid access token, fetching a new one if the cache is empty or
    /// expired.
    pub async fn get_token(&self) -> AccessProfileResult<String> {
        {
            let cache = self.cached_token.read().await;
            if let Some(cached) = cache.as_ref() {
                if !cached.is_expired() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        debug!(token_url = %self.token_url, "Fetching OAuth2 access token");
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AccessProfileError::Auth(format!("Token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(AccessProfileError::Auth(format!(
                "Token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AccessProfileError::Auth(format!("Failed to parse token response: {e}"))
        })?;

        let expires_at = token.expires_in.map(|secs| {
            Instant::now() + Duration::from_secs(secs.saturating_sub(EXPIRY_MARGIN_SECS))
        });

        let mut cache = self.cached_token.write().await;
        *cache = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });

        Ok(token.access_token)
    }

    /// Apply bearer authentication to a request builder.
    pub async fn apply(&self, builder: RequestBuilder) -> AccessProfileResult<RequestBuilder> {
        let token = self.get_token().await?;
        Ok(builder.bearer_auth(token))
    }

    /// Drop the cached token (e.g., on a 401 response).
    pub async fn invalidate(&self) {
        let mut cache = self.cached_token.write().await;
        *cache = None;
    }
}
