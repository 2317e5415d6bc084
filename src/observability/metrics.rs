//! Metrics collection.
//!
//! # Metrics
//! - `client_requests_total` (counter): requests by method, status
//! - `client_request_duration_seconds` (histogram): latency by method
//! - `client_refresh_total` (counter): refresh outcomes
//! - `client_rejected_total` (counter): requests refused before sending
//!
//! Recorded through the `metrics` facade; the embedding application picks
//! the exporter. Without one installed these are no-ops.

use std::time::Instant;

/// Record a completed request attempt.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!(
        "client_requests_total",
        "method" => method.to_string(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "client_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a refresh outcome ("success", "coalesced", "failed", "no_token").
pub fn record_refresh(outcome: &'static str) {
    metrics::counter!("client_refresh_total", "outcome" => outcome).increment(1);
}

/// Record a request refused locally ("missing_token", "cancelled").
pub fn record_rejected(reason: &'static str) {
    metrics::counter!("client_rejected_total", "reason" => reason).increment(1);
}
