//! Error types for the Access Profile connector.

use thiserror::Error;

/// Result type alias using `AccessProfileError`.
pub type AccessProfileResult<T> = Result<T, AccessProfileError>;

/// Errors that can occur when talking to the Access Profiles API.
///
/// None of these escape the reconciliation hook: the client's `Option`
/// operations turn them into an absent result, which the hook treats as
/// "leave the update unchanged".
#[derive(Debug, Error)]
pub enum AccessProfileError {
    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// `OAuth2` authentication error.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered 429 Too Many Requests.
    #[error("Rate limit exceeded (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Access Profile does not exist.
    #[error("Access Profile not found: {0}")]
    NotFound(String),

    /// Any other non-success response.
    #[error("Access Profiles API error (status {status}): {detail}")]
    Api { status: u16, detail: String },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rate-limit retries were exhausted.
    #[error("Maximum retries exceeded after {attempts} attempt(s): {message}")]
    MaxRetriesExceeded { attempts: u32, message: String },
}

impl AccessProfileError {
    /// Whether this error is a rate-limit response, the only retryable case.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Server-requested wait before the next attempt (`Retry-After`).
    #[must_use]
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            Self::RateLimited {
                retry_after_secs: Some(secs),
            } => Some(std::time::Duration::from_secs(*secs)),
            _ => None,
        }
    }

    /// HTTP status associated with the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::NotFound(_) => Some(404),
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
