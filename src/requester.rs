//! A single logical GET: rate limited, retried with exponential backoff.

use crate::error::{Error, Result};
use crate::metrics::MetricsCollector;
use crate::rate_limit::RateLimiter;
use crate::transport::{Transport, TransportError};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Upper bound for a single backoff sleep.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Backoff before retry number `attempt` (1-based): `min(2^attempt, 60)` seconds.
pub fn backoff_delay(attempt: u32) -> Duration {
    if attempt >= 6 {
        return MAX_BACKOFF;
    }
    Duration::from_secs(1 << attempt).min(MAX_BACKOFF)
}

/// Line logged before each retry.
pub fn retry_notice(err: &TransportError, attempt: u32, max_retries: u32, delay: Duration) -> String {
    format!(
        "Request failed ({}), retrying in {}s (retry {}/{})",
        err,
        delay.as_secs(),
        attempt,
        max_retries
    )
}

pub struct RetryingRequester {
    transport: Arc<dyn Transport>,
    rate_limiter: RateLimiter,
    max_retries: u32,
    retry_client_errors: bool,
    metrics: MetricsCollector,
}

impl RetryingRequester {
    pub fn new(
        transport: Arc<dyn Transport>,
        rate_limiter: RateLimiter,
        max_retries: u32,
        metrics: MetricsCollector,
    ) -> Self {
        Self {
            transport,
            rate_limiter,
            max_retries,
            retry_client_errors: true,
            metrics,
        }
    }

    /// When disabled, 4xx answers other than 408/429 fail without retrying.
    pub fn with_retry_client_errors(mut self, retry: bool) -> Self {
        self.retry_client_errors = retry;
        self
    }

    pub async fn request(&self, url: &str, params: &[(&str, String)]) -> Result<Value> {
        let mut attempt: u32 = 0;

        loop {
            self.rate_limiter.wait().await;

            let started = Instant::now();
            let err = match self.transport.get_json(url, params).await {
                Ok(body) => {
                    self.metrics.record_success(started.elapsed());
                    return Ok(body);
                }
                Err(err) => {
                    self.metrics.record_failure(started.elapsed());
                    err
                }
            };

            attempt += 1;
            if attempt > self.max_retries || (!self.retry_client_errors && err.is_client_error()) {
                log::error!("Request to {} failed after {} attempt(s): {}", url, attempt, err);
                return Err(Error::Request {
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = backoff_delay(attempt);
            log::warn!("{}", retry_notice(&err, attempt, self.max_retries, delay));
            self.metrics.increment_retries();
            sleep(delay).await;
        }
    }
}
