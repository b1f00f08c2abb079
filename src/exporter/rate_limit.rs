//! Server-directed rate-limit backoff
//!
//! On a 429 the request is repeated after the `retry-after` delay, falling
//! back to exponential backoff when the header is missing. The number of
//! consecutive retries is bounded.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use super::config::calculate_backoff;
use crate::fetcher::{classify_status, ApiResponse, FetcherError, FetcherResult, StatusClass};
use crate::metrics::record_rate_limit_wait;

/// Rate-limit backoff errors
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Still rate limited after the retry budget
    #[error("still rate limited after {attempts} retries")]
    Exhausted {
        /// Retries performed
        attempts: u32,
    },

    /// The request itself failed
    #[error(transparent)]
    Fetcher(#[from] FetcherError),
}

/// Repeats a request while the server answers 429
#[derive(Debug, Clone, Copy)]
pub struct RateLimitBackoff {
    max_retries: u32,
}

impl RateLimitBackoff {
    /// Allow up to `max_retries` retries per request
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Retry budget
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Wait before retry number `retry` (0-based)
    pub fn delay_for(&self, retry_after: Option<Duration>, retry: u32) -> Duration {
        retry_after.unwrap_or_else(|| calculate_backoff(retry))
    }

    /// Send `request` until the response is not a 429.
    ///
    /// Returns the first non-429 response, whatever its status.
    pub async fn send<F, Fut>(&self, mut request: F) -> Result<ApiResponse, RateLimitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = FetcherResult<ApiResponse>>,
    {
        let mut retries = 0;
        loop {
            let response = request().await?;
            let StatusClass::RateLimited { retry_after } = classify_status(&response) else {
                return Ok(response);
            };

            if retries >= self.max_retries {
                return Err(RateLimitError::Exhausted { attempts: retries });
            }

            let delay = self.delay_for(retry_after, retries);
            retries += 1;
            record_rate_limit_wait(delay);
            warn!(
                retry_after_secs = delay.as_secs_f64(),
                attempt = retries,
                max_retries = self.max_retries,
                header = response.retry_after.as_deref().unwrap_or("<missing>"),
                "Rate limited. Waiting to retry"
            );
            sleep(delay).await;
        }
    }
}
