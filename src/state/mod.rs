//! Application state: the single active dataset slot.
//!
//! Exactly one dataset is active at a time. All mutation goes through this
//! type's entry points; there is no ambient global.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::classify::ClassifiedQuery;
use crate::errors::AppError;
use crate::models::{ActivityRecord, Category, Dataset};

/// Label given to the dataset produced by a fresh import.
pub const USER_DATASET_LABEL: &str = "Your Google History";

/// The single mutable active-dataset slot.
#[derive(Default)]
pub struct ActiveDataset {
    slot: RwLock<Option<Dataset>>,
}

impl ActiveDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the given dataset the active one, replacing any previous choice.
    pub async fn activate(&self, dataset: Dataset) {
        *self.slot.write().await = Some(dataset);
    }

    /// A clone of the active dataset, if any.
    pub async fn current(&self) -> Option<Dataset> {
        self.slot.read().await.clone()
    }

    /// Replace the active dataset's records in place, keeping source and
    /// label. Fails when no dataset is active.
    pub async fn set_records(&self, records: Vec<ActivityRecord>) -> Result<(), AppError> {
        let mut guard = self.slot.write().await;
        match guard.as_mut() {
            Some(dataset) => {
                dataset.records = records;
                Ok(())
            }
            None => Err(AppError::NoActiveDataset),
        }
    }
}

/// Merge classification results into a record array by exact query match.
///
/// The first result wins when a query string repeats; results whose query is
/// not present in the dataset are ignored, so the output length always equals
/// the input length. Categories are reconciled against the catalog.
pub fn merge_classification(
    records: &[ActivityRecord],
    results: &[ClassifiedQuery],
) -> Vec<ActivityRecord> {
    let mut by_query: HashMap<&str, Category> = HashMap::new();
    for result in results {
        by_query
            .entry(result.query.as_str())
            .or_insert_with(|| Category::resolve(&result.category.id, &result.category.name));
    }

    records
        .iter()
        .cloned()
        .map(|mut record| {
            if let Some(category) = by_query.get(record.query.as_str()) {
                record.category = category.clone();
            }
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coords;

    fn record(query: &str) -> ActivityRecord {
        ActivityRecord::new(query.to_string(), None, Coords::default())
    }

    fn classified(query: &str, category_id: &str) -> ClassifiedQuery {
        ClassifiedQuery {
            query: query.to_string(),
            category: Category::by_id(category_id).unwrap(),
        }
    }

    #[test]
    fn test_merge_assigns_matching_categories() {
        let records = vec![record("rust lifetimes"), record("banana bread recipe")];
        let results = vec![
            classified("rust lifetimes", "3"),
            classified("banana bread recipe", "5"),
        ];

        let merged = merge_classification(&records, &results);
        assert_eq!(merged[0].category.id, "3");
        assert_eq!(merged[1].category.id, "5");
    }

    #[test]
    fn test_merge_ignores_unknown_queries() {
        let records = vec![record("rust lifetimes")];
        let results = vec![classified("query that is not in the dataset", "3")];

        let merged = merge_classification(&records, &results);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].category.name, "Uncategorized");
    }

    #[test]
    fn test_merge_first_result_wins_on_repeats() {
        let records = vec![record("sports news")];
        let results = vec![classified("sports news", "11"), classified("sports news", "2")];

        let merged = merge_classification(&records, &results);
        assert_eq!(merged[0].category.id, "11");
    }

    #[test]
    fn test_merge_applies_to_every_matching_record() {
        let records = vec![record("sports news"), record("sports news")];
        let results = vec![classified("sports news", "11")];

        let merged = merge_classification(&records, &results);
        assert!(merged.iter().all(|r| r.category.id == "11"));
    }
}
