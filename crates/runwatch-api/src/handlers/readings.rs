//! Sensor reading ingestion.

use axum::extract::State;
use axum::Json;
use runwatch_models::{DetectionResult, RoomId, SensorReading, SyncMessage};
use tracing::{debug, info};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// `POST /sensor/reading`: classify and, for room members, broadcast.
pub async fn post_reading(
    State(state): State<AppState>,
    Json(reading): Json<SensorReading>,
) -> ApiResult<Json<DetectionResult>> {
    reading.validate()?;
    if !reading.movement_speed.is_finite() || !reading.noise_level.is_finite() {
        return Err(ApiError::Validation("readings must be finite numbers".to_string()));
    }
    if let Some(room_id) = &reading.room_id {
        RoomId::parse(room_id).map_err(|e| ApiError::bad_request(e.to_string()))?;
    }

    state.snapshots.spawn_sweep();

    let result = state.rooms.classify(&reading).await;
    metrics::record_reading(result.status.as_str());

    if result.status.is_alert() {
        info!(
            zone = %result.zone_name,
            room_id = %result.room_id,
            status = result.status.as_str(),
            speed = result.movement_speed,
            noise = result.noise_level,
            "Alert classified"
        );
    } else {
        debug!(zone = %result.zone_name, room_id = %result.room_id, streak = result.streak, "Quiet reading");
    }

    if reading.room_id.is_some() {
        state
            .hub
            .publish(&result.room_id, &SyncMessage::state(result.clone()))
            .await;
    }

    Ok(Json(result))
}
