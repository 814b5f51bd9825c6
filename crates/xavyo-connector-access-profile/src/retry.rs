//! Exponential backoff retry for rate-limited Access Profiles API calls.
//!
//! Only `429 Too Many Requests` is retried. Every other failure is returned to
//! the caller on the first attempt.

use crate::error::{AccessProfileError, AccessProfileResult};
use std::time::Duration;
use tracing::{debug, warn};

/// Default maximum number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Default backoff multiplier.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 = no retries).
    pub max_retries: u32,
    /// Base delay multiplied by `2^n` for the n-th retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy.
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Whether the error should be retried, given how many retries were
    /// already made.
    #[must_use]
    pub fn should_retry(&self, retries_made: u32, error: &AccessProfileError) -> bool {
        retries_made < self.max_retries && error.is_rate_limited()
    }

    /// Delay before the given retry (1-based): `base_delay * 2^retry`.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay.saturating_mul(factor)
    }

    /// Delay before the given retry after `error`: the backoff delay, or the
    /// server's `Retry-After` when that is longer.
    #[must_use]
    pub fn delay_after(&self, retry: u32, error: &AccessProfileError) -> Duration {
        let backoff = self.delay_for(retry);
        error
            .retry_after()
            .map_or(backoff, |requested| backoff.max(requested))
    }

    /// Execute an async request with retry.
    ///
    /// `url` is only used for logging. Each retry is logged at `debug` with the
    /// URL, the triggering error and the attempt number.
    pub async fn execute<F, Fut, T>(&self, url: &str, mut f: F) -> AccessProfileResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = AccessProfileResult<T>>,
    {
        let mut retries: u32 = 0;
        loop {
            match f().await {
                Ok(value) => {
                    if retries > 0 {
                        debug!(url, retries, "Request succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(error) if self.should_retry(retries, &error) => {
                    retries += 1;
                    let delay = self.delay_after(retries, &error);
                    debug!(
                        url,
                        error = %error,
                        attempt = retries,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying API [{url}] due to request error: [{error}]. Try number [{retries}]"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) if error.is_rate_limited() => {
                    warn!(url, attempts = retries + 1, "Rate limit retries exhausted");
                    return Err(AccessProfileError::MaxRetriesExceeded {
                        attempts: retries + 1,
                        message: format!("{url}: {error}"),
                    });
                }
                Err(error) => return Err(error),
            }
        }
    }
}
