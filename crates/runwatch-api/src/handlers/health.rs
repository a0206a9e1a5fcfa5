//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub snapshot_dir: String,
    pub rooms: usize,
    pub live_rooms: usize,
}

/// Readiness check endpoint. Fails while the snapshot directory is missing.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let snapshots_ok = tokio::fs::metadata(state.snapshots.dir())
        .await
        .is_ok_and(|m| m.is_dir());

    let response = ReadinessResponse {
        status: if snapshots_ok { "ready" } else { "not_ready" }.to_string(),
        snapshot_dir: if snapshots_ok { "ok" } else { "missing" }.to_string(),
        rooms: state.rooms.room_count().await,
        live_rooms: state.hub.room_count().await,
    };

    if snapshots_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
