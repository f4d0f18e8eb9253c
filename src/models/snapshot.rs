//! Saved dataset snapshot model.

use serde::{Deserialize, Serialize};

use super::ActivityRecord;

/// A named, persisted copy of a dataset the user explicitly chose to keep.
/// Saving under an existing label supersedes that snapshot in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSnapshot {
    pub id: String,
    pub label: String,
    pub records: Vec<ActivityRecord>,
    /// RFC 3339 save timestamp, refreshed on every rewrite.
    pub date: String,
}

/// Snapshot listing entry without the records payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInfo {
    pub id: String,
    pub label: String,
    pub date: String,
    pub record_count: usize,
}

impl From<&SavedSnapshot> for SnapshotInfo {
    fn from(snapshot: &SavedSnapshot) -> Self {
        SnapshotInfo {
            id: snapshot.id.clone(),
            label: snapshot.label.clone(),
            date: snapshot.date.clone(),
            record_count: snapshot.records.len(),
        }
    }
}
