//! Per-zone alert history.

use axum::extract::{Path, Query, State};
use axum::Json;
use runwatch_models::ZoneAlerts;
use serde::Deserialize;

use crate::classify::DEFAULT_ROOM;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    #[serde(default)]
    pub room_id: Option<String>,
}

/// `GET /alerts/{zone}`: recent alerts of a zone, newest first.
pub async fn get_alerts(
    State(state): State<AppState>,
    Path(zone): Path<String>,
    Query(query): Query<AlertsQuery>,
) -> Json<ZoneAlerts> {
    let room_id = query.room_id.as_deref().unwrap_or(DEFAULT_ROOM);
    Json(state.rooms.alerts(room_id, &zone).await)
}
