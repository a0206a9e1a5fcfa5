//! Snapshot upload.

use axum::extract::State;
use axum::Json;
use runwatch_models::{SnapshotUpload, SnapshotUploadResponse};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `POST /upload/snapshot`: store a still frame and return its URL.
pub async fn upload_snapshot(
    State(state): State<AppState>,
    Json(upload): Json<SnapshotUpload>,
) -> ApiResult<Json<SnapshotUploadResponse>> {
    if upload.zone.trim().is_empty() {
        return Err(ApiError::Validation("zone is required".to_string()));
    }

    let url = state.snapshots.save(&upload).await?;
    Ok(Json(SnapshotUploadResponse { url }))
}
