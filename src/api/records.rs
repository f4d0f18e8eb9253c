//! Record API endpoints: filtered listing and single-record category edits.

use axum::extract::{Json, Path, Query, State};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{ActivityRecord, Category, DatasetSource};
use crate::AppState;

/// Filters for the record listing, all optional and combined with AND.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFilter {
    /// Case-insensitive substring match against the query text or the
    /// category name.
    #[serde(default)]
    pub query: Option<String>,
    /// Exact category id.
    #[serde(default)]
    pub category_id: Option<String>,
    /// Four-digit year taken from the record timestamp.
    #[serde(default)]
    pub year: Option<String>,
}

/// GET /api/dataset/records - Records of the active dataset, filtered.
pub async fn list_records(
    State(state): State<AppState>,
    Query(filter): Query<RecordFilter>,
) -> ApiResult<Vec<ActivityRecord>> {
    let dataset = state.active.current().await.ok_or(AppError::NoActiveDataset)?;

    let needle = filter
        .query
        .as_deref()
        .map(str::to_lowercase)
        .filter(|q| !q.is_empty());

    let records = dataset
        .records
        .into_iter()
        .filter(|record| {
            let query_match = needle.as_deref().map_or(true, |needle| {
                record.query.to_lowercase().contains(needle)
                    || record.category.name.to_lowercase().contains(needle)
            });

            let category_match = filter
                .category_id
                .as_deref()
                .map_or(true, |id| record.category.id == id);

            let year_match = filter.year.as_deref().map_or(true, |year| {
                record
                    .timestamp
                    .as_deref()
                    .and_then(|ts| ts.get(..4))
                    .map_or(false, |ts_year| ts_year == year)
            });

            query_match && category_match && year_match
        })
        .collect();

    success(records)
}

/// Request body for a category edit.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub category_id: String,
}

/// PUT /api/dataset/records/{id}/category - Reassign one record's category
/// and write it back to whichever collection backs the active dataset.
pub async fn update_record_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCategoryRequest>,
) -> ApiResult<ActivityRecord> {
    let category = Category::by_id(&request.category_id).ok_or_else(|| {
        AppError::Validation(format!("Unknown category id \"{}\"", request.category_id))
    })?;

    let dataset = state.active.current().await.ok_or(AppError::NoActiveDataset)?;

    let mut updated = dataset.records.clone();
    let target = updated
        .iter_mut()
        .find(|record| record.id == Some(id))
        .ok_or_else(|| {
            AppError::NotFound(format!("Record {} not found in the active dataset", id))
        })?;
    target.category = category.clone();
    let updated_record = target.clone();

    match dataset.source {
        DatasetSource::User => {
            state.repo.update_record_category(id, &category).await?;
        }
        DatasetSource::Saved => {
            // Saved datasets are rewritten whole, not patched in place.
            state
                .repo
                .rewrite_snapshot_records(&dataset.label, &updated)
                .await?;
        }
        DatasetSource::Sample => {
            // Sample datasets are read-only files; the edit lives in the
            // active slot only.
        }
    }

    state.active.set_records(updated).await?;
    success(updated_record)
}
