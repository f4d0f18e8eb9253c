//! Saved snapshot API endpoints.

use axum::extract::{Json, Path, State};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::SnapshotInfo;
use crate::AppState;

/// GET /api/snapshots - All saved snapshots, most recent first.
pub async fn list_snapshots(State(state): State<AppState>) -> ApiResult<Vec<SnapshotInfo>> {
    let snapshots = state.repo.list_snapshots().await?;
    success(snapshots.iter().map(SnapshotInfo::from).collect())
}

/// Request body for saving the active dataset as a snapshot.
#[derive(Debug, Deserialize)]
pub struct SaveSnapshotRequest {
    pub label: String,
}

/// POST /api/snapshots - Save the active dataset under a label, superseding
/// any existing snapshot with that label.
pub async fn save_snapshot(
    State(state): State<AppState>,
    Json(request): Json<SaveSnapshotRequest>,
) -> ApiResult<SnapshotInfo> {
    let label = request.label.trim();
    if label.is_empty() {
        return Err(AppError::Validation(
            "A snapshot label is required".to_string(),
        ));
    }

    let dataset = state.active.current().await.ok_or(AppError::NoActiveDataset)?;
    let snapshot = state.repo.put_snapshot(label, &dataset.records).await?;

    tracing::info!(label = %snapshot.label, records = snapshot.records.len(), "saved dataset snapshot");

    success(SnapshotInfo::from(&snapshot))
}

/// DELETE /api/snapshots/{id} - Remove a saved snapshot.
pub async fn delete_snapshot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_snapshot(&id).await?;
    success(())
}
