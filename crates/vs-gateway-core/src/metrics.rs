//! Metrics for the vector store gateway
//!
//! Provides Prometheus-compatible metrics through the `metrics` facade.

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Metric names as constants for consistency
pub mod names {
    // Validation metrics
    pub const VALIDATION_REJECTIONS_TOTAL: &str = "vs_gateway_validation_rejections_total";

    // Poller metrics
    pub const POLLER_FETCHES_TOTAL: &str = "vs_poller_fetches_total";
    pub const POLLER_SLEEP_SECONDS: &str = "vs_poller_sleep_seconds";
    pub const POLLER_OUTCOMES_TOTAL: &str = "vs_poller_outcomes_total";
    pub const POLLER_SESSION_DURATION: &str = "vs_poller_session_duration_seconds";

    // Provider metrics
    pub const PROVIDER_REQUESTS_TOTAL: &str = "vs_provider_requests_total";
    pub const PROVIDER_REQUEST_LATENCY: &str = "vs_provider_request_latency_seconds";
}

/// Labels for metrics
pub mod labels {
    pub const FIELD: &str = "field";
    pub const RESOURCE_KIND: &str = "resource_kind";
    pub const OUTCOME: &str = "outcome";
    pub const STATUS: &str = "status";
    pub const OPERATION: &str = "operation";
}

/// Validation metrics
#[derive(Clone, Default)]
pub struct ValidationMetrics;

impl ValidationMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Record a rejected request field
    pub fn record_rejection(&self, field: &str) {
        counter!(
            names::VALIDATION_REJECTIONS_TOTAL,
            labels::FIELD => field.to_string(),
        )
        .increment(1);
    }
}

/// Poller metrics, one per resource kind
#[derive(Clone)]
pub struct PollerMetrics {
    resource_kind: &'static str,
}

impl PollerMetrics {
    pub fn new(resource_kind: &'static str) -> Self {
        Self { resource_kind }
    }

    /// Record a status fetch
    pub fn record_fetch(&self) {
        counter!(
            names::POLLER_FETCHES_TOTAL,
            labels::RESOURCE_KIND => self.resource_kind,
        )
        .increment(1);
    }

    /// Record a backoff sleep
    pub fn record_sleep(&self, duration: Duration) {
        histogram!(
            names::POLLER_SLEEP_SECONDS,
            labels::RESOURCE_KIND => self.resource_kind,
        )
        .record(duration.as_secs_f64());
    }

    /// Record how a session ended: "terminal", "timeout" or "error"
    pub fn record_outcome(&self, outcome: &'static str) {
        counter!(
            names::POLLER_OUTCOMES_TOTAL,
            labels::RESOURCE_KIND => self.resource_kind,
            labels::OUTCOME => outcome,
        )
        .increment(1);
    }

    /// Record total session duration
    pub fn record_session_duration(&self, duration: Duration) {
        histogram!(
            names::POLLER_SESSION_DURATION,
            labels::RESOURCE_KIND => self.resource_kind,
        )
        .record(duration.as_secs_f64());
    }
}

/// Provider client metrics
#[derive(Clone)]
pub struct ProviderMetrics {
    operation: &'static str,
}

impl ProviderMetrics {
    pub fn new(operation: &'static str) -> Self {
        Self { operation }
    }

    /// Record a completed request by status class ("2xx", "4xx", "transport", ...)
    pub fn record_request(&self, status: &'static str) {
        counter!(
            names::PROVIDER_REQUESTS_TOTAL,
            labels::OPERATION => self.operation,
            labels::STATUS => status,
        )
        .increment(1);
    }

    pub fn record_latency(&self, duration: Duration) {
        histogram!(
            names::PROVIDER_REQUEST_LATENCY,
            labels::OPERATION => self.operation,
        )
        .record(duration.as_secs_f64());
    }
}

/// Timer guard for automatic latency recording
pub struct LatencyTimer<F>
where
    F: FnOnce(Duration),
{
    start: Instant,
    on_drop: Option<F>,
}

impl<F> LatencyTimer<F>
where
    F: FnOnce(Duration),
{
    /// Start a new timer
    pub fn start(on_drop: F) -> Self {
        Self {
            start: Instant::now(),
            on_drop: Some(on_drop),
        }
    }

    /// Get elapsed time without stopping
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop timer and record
    pub fn stop(mut self) -> Duration {
        let elapsed = self.start.elapsed();
        if let Some(f) = self.on_drop.take() {
            f(elapsed);
        }
        elapsed
    }
}

impl<F> Drop for LatencyTimer<F>
where
    F: FnOnce(Duration),
{
    fn drop(&mut self) {
        if let Some(f) = self.on_drop.take() {
            f(self.start.elapsed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_timer() {
        let mut recorded = None;
        {
            let timer = LatencyTimer::start(|d| recorded = Some(d));
            std::thread::sleep(Duration::from_millis(10));
            timer.stop();
        }
        assert!(recorded.is_some());
        assert!(recorded.unwrap() >= Duration::from_millis(10));
    }

    #[test]
    fn timer_records_on_drop() {
        let mut fired = false;
        {
            let _timer = LatencyTimer::start(|_| fired = true);
        }
        assert!(fired);
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        PollerMetrics::new("vector_store").record_fetch();
        PollerMetrics::new("vector_store").record_outcome("timeout");
        ValidationMetrics::new().record_rejection("filters");
        ProviderMetrics::new("search").record_request("2xx");
    }
}
