//! Minimum-interval rate limiting for outbound requests.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

pub struct RateLimiter {
    min_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// A rate of zero (or anything not strictly positive) disables limiting.
    pub fn new(max_requests_per_second: f64) -> Self {
        let min_delay = if max_requests_per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / max_requests_per_second).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };

        Self {
            min_delay,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Sleeps until `min_delay` has passed since the previous call, then
    /// stamps the current time as the last request.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_delay {
                let remaining = self.min_delay - elapsed;
                log::trace!("Rate limit: sleeping {:?}", remaining);
                sleep(remaining).await;
            }
        }

        *last = Some(Instant::now());
    }
}
