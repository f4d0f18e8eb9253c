//! Dataset API endpoints: import, selection, summary, CSV export.

use std::collections::BTreeMap;

use axum::{
    extract::{Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::export::render_csv;
use crate::models::{Dataset, DatasetFileRecord, DatasetSource};
use crate::parser::parse_activity_html;
use crate::state::USER_DATASET_LABEL;
use crate::AppState;

/// Outcome of an import, without echoing the full record array back.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub source: DatasetSource,
    pub label: String,
    pub record_count: usize,
}

/// POST /api/import - Parse a Takeout "My Activity" export (raw HTML body),
/// replace the current import, and make it the active dataset.
pub async fn import_activity(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<ImportSummary> {
    let mut records = parse_activity_html(&body);
    if records.is_empty() {
        return Err(AppError::Validation(
            "No valid search records found in the file".to_string(),
        ));
    }

    state.repo.replace_records(&mut records).await?;
    let record_count = records.len();

    state
        .active
        .activate(Dataset {
            source: DatasetSource::User,
            label: USER_DATASET_LABEL.to_string(),
            records,
        })
        .await;

    tracing::info!(records = record_count, "imported activity export");

    success(ImportSummary {
        source: DatasetSource::User,
        label: USER_DATASET_LABEL.to_string(),
        record_count,
    })
}

/// GET /api/dataset - The active dataset.
pub async fn get_dataset(State(state): State<AppState>) -> ApiResult<Dataset> {
    let dataset = state.active.current().await.ok_or(AppError::NoActiveDataset)?;
    success(dataset)
}

/// Request body for dataset selection.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub source: DatasetSource,
    #[serde(default)]
    pub label: Option<String>,
}

/// POST /api/dataset/select - Load a dataset from its backing collection and
/// make it active.
pub async fn select_dataset(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> ApiResult<Dataset> {
    let dataset = match request.source {
        DatasetSource::User => {
            let records = state.repo.list_records().await?;
            if records.is_empty() {
                return Err(AppError::NotFound(
                    "No imported history available".to_string(),
                ));
            }
            Dataset {
                source: DatasetSource::User,
                label: USER_DATASET_LABEL.to_string(),
                records,
            }
        }
        DatasetSource::Saved => {
            let label = required_label(&request)?;
            let snapshot = state
                .repo
                .get_snapshot_by_label(&label)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Saved dataset \"{}\" not found", label))
                })?;
            Dataset {
                source: DatasetSource::Saved,
                label: snapshot.label,
                records: snapshot.records,
            }
        }
        DatasetSource::Sample => {
            let label = required_label(&request)?;
            let records = load_sample(&state, &label).await?;
            Dataset {
                source: DatasetSource::Sample,
                label,
                records,
            }
        }
    };

    state.active.activate(dataset.clone()).await;
    success(dataset)
}

fn required_label(request: &SelectRequest) -> Result<String, AppError> {
    match request.label.as_deref().map(str::trim) {
        Some(label) if !label.is_empty() => Ok(label.to_string()),
        _ => Err(AppError::Validation(
            "A dataset label is required for this source".to_string(),
        )),
    }
}

/// GET /api/samples - Labels of the bundled sample datasets.
pub async fn list_samples(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let Some(dir) = state.config.sample_dir.as_ref() else {
        return success(Vec::new());
    };

    let mut labels = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| AppError::Internal(format!("Cannot read sample directory: {}", e)))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::Internal(format!("Cannot read sample directory: {}", e)))?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                labels.push(stem.to_string());
            }
        }
    }
    labels.sort();
    success(labels)
}

async fn load_sample(
    state: &AppState,
    label: &str,
) -> Result<Vec<crate::models::ActivityRecord>, AppError> {
    let dir = state.config.sample_dir.as_ref().ok_or_else(|| {
        AppError::NotFound("No sample datasets configured".to_string())
    })?;

    if label.contains('/') || label.contains('\\') || label.contains("..") {
        return Err(AppError::Validation("Invalid sample label".to_string()));
    }

    let path = dir.join(format!("{}.json", label));
    let bytes = tokio::fs::read(&path).await.map_err(|_| {
        AppError::NotFound(format!("Sample dataset \"{}\" not found", label))
    })?;

    let raw: Vec<DatasetFileRecord> = serde_json::from_slice(&bytes)?;
    Ok(raw.into_iter().map(DatasetFileRecord::normalize).collect())
}

/// Per-category record count within the active dataset.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub id: String,
    pub name: String,
    pub color: String,
    pub count: usize,
}

/// Aggregated view of the active dataset for the chart components.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub source: DatasetSource,
    pub label: String,
    pub total: usize,
    /// Record counts keyed by calendar day ("YYYY-MM-DD"); records without a
    /// timestamp are not counted here.
    pub days: BTreeMap<String, usize>,
    pub categories: Vec<CategoryCount>,
}

/// GET /api/dataset/summary - Per-day and per-category counts for the active
/// dataset.
pub async fn dataset_summary(State(state): State<AppState>) -> ApiResult<DatasetSummary> {
    let dataset = state.active.current().await.ok_or(AppError::NoActiveDataset)?;

    let mut days: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_category: BTreeMap<String, CategoryCount> = BTreeMap::new();

    for record in &dataset.records {
        if let Some(day) = record.timestamp.as_deref().and_then(|ts| ts.get(..10)) {
            *days.entry(day.to_string()).or_default() += 1;
        }

        by_category
            .entry(record.category.id.clone())
            .or_insert_with(|| CategoryCount {
                id: record.category.id.clone(),
                name: record.category.name.clone(),
                color: record.category.color.clone(),
                count: 0,
            })
            .count += 1;
    }

    let mut categories: Vec<CategoryCount> = by_category.into_values().collect();
    categories.sort_by(|a, b| b.count.cmp(&a.count));

    success(DatasetSummary {
        source: dataset.source,
        label: dataset.label,
        total: dataset.records.len(),
        days,
        categories,
    })
}

/// GET /api/export/csv - The active dataset as a CSV attachment.
pub async fn export_csv(State(state): State<AppState>) -> Result<Response, AppError> {
    let dataset = state.active.current().await.ok_or(AppError::NoActiveDataset)?;
    let csv = render_csv(&dataset.records);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"search_dataset_export.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}
