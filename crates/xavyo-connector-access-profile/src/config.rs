//! Client configuration for the Access Profiles API.
//!
//! The configuration is an explicit, immutable value built once and handed to
//! [`AccessProfileClient`](crate::client::AccessProfileClient) at
//! construction. Two loaders are provided: the connector source config JSON
//! supplied by the host, and process environment variables.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::retry::RetryPolicy;

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration value: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Connection settings for the Access Profiles API.
pub struct AccessProfileConfig {
    /// API base URL (e.g., `https://acme.api.identitynow.com`), no trailing slash.
    pub base_url: String,
    /// `OAuth2` client id.
    pub client_id: String,
    /// `OAuth2` client secret.
    pub client_secret: SecretString,
    /// `OAuth2` token endpoint.
    pub token_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Rate-limit retry policy.
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for AccessProfileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessProfileConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.token_url)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl AccessProfileConfig {
    /// Build and validate a configuration from its parts.
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = validate_url("base_url", &base_url.into())?;
        let token_url = validate_url("token_url", &token_url.into())?;
        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(ConfigError::MissingVar("client_id".to_string()));
        }
        let client_secret = client_secret.into();
        if client_secret.is_empty() {
            return Err(ConfigError::MissingVar("client_secret".to_string()));
        }

        Ok(Self {
            base_url,
            client_id,
            client_secret: SecretString::from(client_secret),
            token_url,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        })
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Load from the connector source configuration supplied by the host.
    ///
    /// Recognised keys: `genericWebServiceBaseUrl`, `client_id`,
    /// `client_secret`, `token_url` and the optional `request_timeout_secs`.
    pub fn from_source_config(source: &Value) -> Result<Self, ConfigError> {
        let field = |name: &str| -> Result<String, ConfigError> {
            source
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ConfigError::MissingVar(name.to_string()))
        };

        let config = Self::new(
            field("genericWebServiceBaseUrl")?,
            field("client_id")?,
            field("client_secret")?,
            field("token_url")?,
        )?;

        match source.get("request_timeout_secs") {
            None | Some(Value::Null) => Ok(config),
            Some(value) => {
                let secs = value.as_u64().ok_or_else(|| ConfigError::InvalidValue {
                    var: "request_timeout_secs".to_string(),
                    message: "must be a non-negative integer".to_string(),
                })?;
                Ok(config.with_request_timeout(Duration::from_secs(secs)))
            }
        }
    }

    /// Load from environment variables (a `.env` file is honoured if present).
    ///
    /// # Required Variables
    ///
    /// - `ISC_BASE_URL`
    /// - `ISC_CLIENT_ID`
    /// - `ISC_CLIENT_SECRET`
    /// - `ISC_TOKEN_URL`
    ///
    /// # Optional Variables
    ///
    /// - `ISC_REQUEST_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let var = |name: &str| env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()));

        let config = Self::new(
            var("ISC_BASE_URL")?,
            var("ISC_CLIENT_ID")?,
            var("ISC_CLIENT_SECRET")?,
            var("ISC_TOKEN_URL")?,
        )?;

        match env::var("ISC_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    var: "ISC_REQUEST_TIMEOUT_SECS".to_string(),
                    message: e.to_string(),
                })?;
                Ok(config.with_request_timeout(Duration::from_secs(secs)))
            }
            Err(_) => Ok(config),
        }
    }

    /// Client secret in clear text, for the token request only.
    pub(crate) fn expose_client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

fn validate_url(var: &str, raw: &str) -> Result<String, ConfigError> {
    if raw.trim().is_empty() {
        return Err(ConfigError::MissingVar(var.to_string()));
    }
    let parsed = url::Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        var: var.to_string(),
        message: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        other => Err(ConfigError::InvalidValue {
            var: var.to_string(),
            message: format!("unsupported scheme: {other}"),
        }),
    }
}
