//! Client metrics.
//!
//! Recorded through the `metrics` facade; a binary that wants them installs
//! an exporter.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Readings sent, by trigger.
    pub const EMISSIONS_TOTAL: &str = "runwatch_client_emissions_total";

    /// Readings that failed to reach the server, by reason.
    pub const EMISSION_FAILURES_TOTAL: &str = "runwatch_client_emission_failures_total";

    /// HTTP requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "runwatch_client_requests_total";

    /// HTTP request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "runwatch_client_latency_seconds";

    /// Room channel reconnect attempts.
    pub const RECONNECTS_TOTAL: &str = "runwatch_client_reconnects_total";

    /// Sync messages by type and direction.
    pub const SYNC_MESSAGES_TOTAL: &str = "runwatch_client_sync_messages_total";

    /// Results discarded because the session moved on.
    pub const STALE_RESULTS_TOTAL: &str = "runwatch_client_stale_results_total";
}

pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

pub fn record_emission(trigger: &'static str) {
    counter!(names::EMISSIONS_TOTAL, "trigger" => trigger).increment(1);
}

pub fn record_emission_failure(reason: &'static str) {
    counter!(names::EMISSION_FAILURES_TOTAL, "reason" => reason).increment(1);
}

pub fn record_reconnect() {
    counter!(names::RECONNECTS_TOTAL).increment(1);
}

pub fn record_sync_message(message_type: &'static str, direction: &'static str) {
    counter!(
        names::SYNC_MESSAGES_TOTAL,
        "type" => message_type,
        "direction" => direction
    )
    .increment(1);
}

pub fn record_stale_result() {
    counter!(names::STALE_RESULTS_TOTAL).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::EMISSIONS_TOTAL.starts_with("runwatch_client_"));
        assert!(names::RECONNECTS_TOTAL.contains("reconnects"));
        assert!(names::LATENCY_SECONDS.contains("latency"));
    }
}
