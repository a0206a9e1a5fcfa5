//! Zone layout served to clients.

use axum::extract::State;
use axum::Json;
use runwatch_models::ZoneLayout;

use crate::state::AppState;

/// `GET /api/map/layout`
pub async fn get_layout(State(state): State<AppState>) -> Json<ZoneLayout> {
    Json(ZoneLayout {
        zones: state.config.layout_zones.clone(),
    })
}
