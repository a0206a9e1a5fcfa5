//! Room dashboard.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderName};
use axum::Json;
use runwatch_models::DashboardStats;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Header carrying the dashboard access code.
pub const ACCESS_CODE_HEADER: HeaderName = HeaderName::from_static("x-access-code");

/// `GET /api/rooms/{room_id}/dashboard`
///
/// Once an access code has been issued, it must accompany the request.
pub async fn get_dashboard(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<DashboardStats>> {
    if let Some(expected) = state.access_code.read().await.as_deref() {
        let presented = headers
            .get(&ACCESS_CODE_HEADER)
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected) {
            return Err(ApiError::unauthorized("valid access code required"));
        }
    }

    Ok(Json(state.rooms.dashboard(&room_id).await))
}
