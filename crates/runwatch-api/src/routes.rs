//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::handlers::{
    get_alerts, get_dashboard, get_layout, health, post_reading, ready, reset_access_code,
    upload_snapshot,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers, IpRateLimiter,
};
use crate::snapshots::SNAPSHOT_URL_PREFIX;
use crate::state::AppState;
use crate::ws::ws_room;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let rate_limiter = IpRateLimiter::new(state.config.rate_limit_rps);

    // Detection client endpoints
    let ingest_routes = Router::new()
        .route("/sensor/reading", post(post_reading))
        .route("/upload/snapshot", post(upload_snapshot))
        .route("/alerts/:zone", get(get_alerts));

    let api_routes = Router::new()
        .route("/map/layout", get(get_layout))
        .route("/auth/reset", post(reset_access_code))
        .route("/rooms/:room_id/dashboard", get(get_dashboard));

    let limited_routes = Router::new()
        .merge(ingest_routes)
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    let ws_routes = Router::new().route("/ws/:room_id", get(ws_room));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let file_routes = Router::new()
        .nest_service(SNAPSHOT_URL_PREFIX, ServeDir::new(state.snapshots.dir()))
        .nest_service("/static", ServeDir::new(&state.config.static_dir));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(limited_routes)
        .merge(ws_routes)
        .merge(health_routes)
        .merge(file_routes)
        .merge(metrics_routes)
        // Snapshots arrive inline; the tower limit replaces axum's 2MB default
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
