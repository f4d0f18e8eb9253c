//! Classification API endpoints.
//!
//! Classification is a two-step flow mirroring the dashboard dialog: preview
//! the service's results first, then apply them to the active dataset.

use axum::extract::{Json, State};

use super::{success, ApiResult};
use crate::classify::ClassifiedQuery;
use crate::errors::AppError;
use crate::models::{Dataset, DatasetSource};
use crate::state::merge_classification;
use crate::AppState;

/// POST /api/classify - Send the active dataset's queries to the
/// classification service and return the raw results. Nothing is mutated.
pub async fn classify_preview(State(state): State<AppState>) -> ApiResult<Vec<ClassifiedQuery>> {
    let dataset = state.active.current().await.ok_or(AppError::NoActiveDataset)?;

    let queries: Vec<String> = dataset
        .records
        .iter()
        .map(|record| record.query.clone())
        .filter(|query| !query.is_empty())
        .collect();

    let results = state.classifier.classify(&queries).await?;
    success(results)
}

/// POST /api/classify/apply - Merge previewed classification results into the
/// active dataset and persist through its backing collection.
pub async fn classify_apply(
    State(state): State<AppState>,
    Json(results): Json<Vec<ClassifiedQuery>>,
) -> ApiResult<Dataset> {
    let dataset = state.active.current().await.ok_or(AppError::NoActiveDataset)?;

    let updated = merge_classification(&dataset.records, &results);

    match dataset.source {
        DatasetSource::User => {
            state.repo.update_record_categories(&updated).await?;
        }
        DatasetSource::Saved => {
            state
                .repo
                .rewrite_snapshot_records(&dataset.label, &updated)
                .await?;
        }
        DatasetSource::Sample => {}
    }

    state.active.set_records(updated.clone()).await?;

    success(Dataset {
        source: dataset.source,
        label: dataset.label,
        records: updated,
    })
}
