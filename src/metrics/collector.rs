use crate::metrics::snapshot::MetricsSnapshot;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::{Duration, Instant};

/// Counters shared between the requester and the orchestrator. Clones share
/// the same underlying counts.
#[derive(Clone)]
pub struct MetricsCollector {
    requests_total: Arc<AtomicU64>,
    requests_success: Arc<AtomicU64>,
    requests_failed: Arc<AtomicU64>,
    retries: Arc<AtomicU64>,
    pages_fetched: Arc<AtomicU64>,
    features_fetched: Arc<AtomicU64>,
    layers_exported: Arc<AtomicU64>,
    records_exported: Arc<AtomicU64>,
    total_response_time_ms: Arc<AtomicU64>,
    start_time: Arc<Instant>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            requests_total: Arc::new(AtomicU64::new(0)),
            requests_success: Arc::new(AtomicU64::new(0)),
            requests_failed: Arc::new(AtomicU64::new(0)),
            retries: Arc::new(AtomicU64::new(0)),
            pages_fetched: Arc::new(AtomicU64::new(0)),
            features_fetched: Arc::new(AtomicU64::new(0)),
            layers_exported: Arc::new(AtomicU64::new(0)),
            records_exported: Arc::new(AtomicU64::new(0)),
            total_response_time_ms: Arc::new(AtomicU64::new(0)),
            start_time: Arc::new(Instant::now()),
        }
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, duration: Duration) {
        self.requests_total.fetch_add(1, Ordering::SeqCst);
        self.requests_success.fetch_add(1, Ordering::SeqCst);
        self.total_response_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn record_failure(&self, duration: Duration) {
        self.requests_total.fetch_add(1, Ordering::SeqCst);
        self.requests_failed.fetch_add(1, Ordering::SeqCst);
        self.total_response_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn increment_retries(&self) {
        self.retries.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_page(&self, features: usize) {
        self.pages_fetched.fetch_add(1, Ordering::SeqCst);
        self.features_fetched
            .fetch_add(features as u64, Ordering::SeqCst);
    }

    pub fn record_export(&self, records: usize) {
        self.layers_exported.fetch_add(1, Ordering::SeqCst);
        self.records_exported
            .fetch_add(records as u64, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_requests = self.requests_total.load(Ordering::SeqCst);
        let success = self.requests_success.load(Ordering::SeqCst);
        let total_time = self.total_response_time_ms.load(Ordering::SeqCst);

        let success_rate = if total_requests > 0 {
            (success as f64 / total_requests as f64) * 100.0
        } else {
            0.0
        };

        let avg_response_time_ms = if total_requests > 0 {
            total_time / total_requests
        } else {
            0
        };

        let elapsed = self.start_time.elapsed().as_secs_f64();

        MetricsSnapshot {
            requests_total: total_requests,
            requests_success: success,
            requests_failed: self.requests_failed.load(Ordering::SeqCst),
            retries: self.retries.load(Ordering::SeqCst),
            pages_fetched: self.pages_fetched.load(Ordering::SeqCst),
            features_fetched: self.features_fetched.load(Ordering::SeqCst),
            layers_exported: self.layers_exported.load(Ordering::SeqCst),
            records_exported: self.records_exported.load(Ordering::SeqCst),
            success_rate,
            avg_response_time_ms,
            requests_per_second: if elapsed > 0.0 {
                total_requests as f64 / elapsed
            } else {
                0.0
            },
            elapsed_seconds: elapsed,
        }
    }
}
