//! Activity record and dataset models matching the frontend interfaces.

use serde::{Deserialize, Serialize};

use super::Category;

/// Geo coordinates extracted from a map link. Both components are kept as the
/// raw strings found in the export, empty when unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coords {
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub lon: String,
}

/// One normalized user search event.
///
/// `id` is assigned by the store on first insert and stays `None` until then.
/// `timestamp` is an RFC 3339 string, or `None` when the export's timestamp
/// text could not be parsed. A record always carries a category; unclassified
/// records carry the uncategorized sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub query: String,
    pub timestamp: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub coords: Coords,
}

impl ActivityRecord {
    /// A fresh, unclassified record as produced by the parser.
    pub fn new(query: String, timestamp: Option<String>, coords: Coords) -> Self {
        ActivityRecord {
            id: None,
            query,
            timestamp,
            category: Category::uncategorized(),
            coords,
        }
    }
}

/// Which persistence collection backs a dataset, and therefore where
/// single-record category edits are written back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSource {
    User,
    Sample,
    Saved,
}

/// The active working set the UI displays. Exactly one dataset is active in
/// the running application at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub source: DatasetSource,
    pub label: String,
    pub records: Vec<ActivityRecord>,
}

/// Record shape accepted from dataset JSON files (samples and user-provided
/// exports). Fields are tolerated loosely; categories are reconciled against
/// the catalog on load.
#[derive(Debug, Deserialize)]
pub struct DatasetFileRecord {
    pub query: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub category: Option<DatasetFileCategory>,
    #[serde(default)]
    pub coords: Option<Coords>,
}

#[derive(Debug, Deserialize)]
pub struct DatasetFileCategory {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl DatasetFileRecord {
    /// Normalize a file record into an [`ActivityRecord`], substituting the
    /// uncategorized sentinel for missing or unknown categories.
    pub fn normalize(self) -> ActivityRecord {
        let category = match &self.category {
            Some(c) => Category::resolve(&c.id, &c.name),
            None => Category::uncategorized(),
        };
        ActivityRecord {
            id: None,
            query: self.query,
            timestamp: self.timestamp,
            category,
            coords: self.coords.unwrap_or_default(),
        }
    }
}
