//! Dashboard access code.

use axum::extract::State;
use axum::Json;
use runwatch_models::AccessCodeResponse;
use tracing::info;

use crate::state::AppState;

/// `POST /api/auth/reset`: issue a fresh code, invalidating the previous one.
///
/// The code is only ever returned in this response.
pub async fn reset_access_code(State(state): State<AppState>) -> Json<AccessCodeResponse> {
    let issued = AccessCodeResponse::generate();
    *state.access_code.write().await = Some(issued.code.clone());
    info!("Dashboard access code rotated");
    Json(issued)
}
