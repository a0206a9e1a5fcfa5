//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "runwatch_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "runwatch_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "runwatch_http_requests_in_flight";

    // Detection metrics
    pub const READINGS_TOTAL: &str = "runwatch_readings_total";

    // Room sync metrics
    pub const WS_CONNECTIONS_TOTAL: &str = "runwatch_ws_connections_total";
    pub const WS_CONNECTIONS_ACTIVE: &str = "runwatch_ws_connections_active";
    pub const WS_MESSAGES_RECEIVED: &str = "runwatch_ws_messages_received_total";
    pub const ROOM_BROADCASTS_TOTAL: &str = "runwatch_room_broadcasts_total";
    pub const ROOM_BROADCAST_RECIPIENTS: &str = "runwatch_room_broadcast_recipients";

    // Snapshot metrics
    pub const SNAPSHOTS_STORED_TOTAL: &str = "runwatch_snapshots_stored_total";
    pub const SNAPSHOT_BYTES: &str = "runwatch_snapshot_bytes";
    pub const SNAPSHOTS_PRUNED_TOTAL: &str = "runwatch_snapshots_pruned_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "runwatch_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a classified reading.
pub fn record_reading(status: &str) {
    let labels = [("status", status.to_string())];
    counter!(names::READINGS_TOTAL, &labels).increment(1);
}

/// Record a room socket connection.
pub fn record_ws_connection() {
    counter!(names::WS_CONNECTIONS_TOTAL).increment(1);
}

/// Update active room sockets gauge.
pub fn set_ws_active_connections(count: i64) {
    gauge!(names::WS_CONNECTIONS_ACTIVE).set(count as f64);
}

/// Record a sync message received from a room socket.
pub fn record_ws_message_received(message_type: &str) {
    let labels = [("type", message_type.to_string())];
    counter!(names::WS_MESSAGES_RECEIVED, &labels).increment(1);
}

/// Record a room broadcast and its fan-out.
pub fn record_room_broadcast(message_type: &str, recipients: usize) {
    let labels = [("type", message_type.to_string())];
    counter!(names::ROOM_BROADCASTS_TOTAL, &labels).increment(1);
    histogram!(names::ROOM_BROADCAST_RECIPIENTS).record(recipients as f64);
}

/// Record a stored snapshot.
pub fn record_snapshot_stored(bytes: usize) {
    counter!(names::SNAPSHOTS_STORED_TOTAL).increment(1);
    histogram!(names::SNAPSHOT_BYTES).record(bytes as f64);
}

/// Record snapshots removed by the retention sweep.
pub fn record_snapshots_pruned(count: usize) {
    counter!(names::SNAPSHOTS_PRUNED_TOTAL).increment(count as u64);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Metrics middleware for HTTP requests.
///
/// Paths are labelled by route template so ids do not explode cardinality.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(&method, &path, response.status().as_u16(), start.elapsed().as_secs_f64());

    response
}
