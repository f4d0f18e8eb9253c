//! Category catalog and lookup helpers.
//!
//! The catalog is fixed at build time and matches the set of labels the
//! classification service emits. Records only ever reference categories by id.

use serde::{Deserialize, Serialize};

/// A topical classification bucket with display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Id of the sentinel category assigned to records that have not been
/// classified yet (or whose stored category cannot be reconciled).
pub const UNCATEGORIZED_ID: &str = "12";

const CATALOG: &[(&str, &str, &str)] = &[
    ("1", "Arts, Culture & Entertainment", "#ff4b5c"),
    ("2", "News, Politics & Society", "#f15bb5"),
    ("3", "Technology & Science", "#3cba54"),
    ("4", "Health & Wellness", "#4ade80"),
    ("5", "Food, Drink & Lifestyle", "#ff6f61"),
    ("6", "Business & Finance", "#ffbe0b"),
    ("7", "Travel & Transportation", "#8ecae6"),
    ("8", "Education & Learning", "#5bc0eb"),
    ("9", "Family & Relationships", "#9d4edd"),
    ("10", "Shopping", "#ffb703"),
    ("11", "Sports", "#8338ec"),
    (UNCATEGORIZED_ID, "Uncategorized", "#aaaaaa"),
];

impl Category {
    fn from_entry(entry: &(&str, &str, &str)) -> Self {
        Category {
            id: entry.0.to_string(),
            name: entry.1.to_string(),
            color: entry.2.to_string(),
        }
    }

    /// The full catalog in display order.
    pub fn all() -> Vec<Category> {
        CATALOG.iter().map(Category::from_entry).collect()
    }

    /// Look up a catalog entry by id.
    pub fn by_id(id: &str) -> Option<Category> {
        CATALOG
            .iter()
            .find(|(catalog_id, _, _)| *catalog_id == id)
            .map(Category::from_entry)
    }

    /// The sentinel category for unclassified records.
    pub fn uncategorized() -> Category {
        Category::by_id(UNCATEGORIZED_ID).expect("catalog contains the uncategorized entry")
    }

    /// Reconcile a category reference from stored or imported data against the
    /// catalog: exact id match first, then a case-insensitive name match (this
    /// absorbs data tagged under the retired "IABnn" catalog, whose ids are
    /// disjoint from ours), falling back to the uncategorized sentinel.
    pub fn resolve(id: &str, name: &str) -> Category {
        if let Some(category) = Category::by_id(id) {
            return category;
        }
        CATALOG
            .iter()
            .find(|(_, catalog_name, _)| catalog_name.eq_ignore_ascii_case(name))
            .map(Category::from_entry)
            .unwrap_or_else(Category::uncategorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_id_known() {
        let cat = Category::by_id("11").unwrap();
        assert_eq!(cat.name, "Sports");
        assert_eq!(cat.color, "#8338ec");
    }

    #[test]
    fn test_by_id_unknown() {
        assert!(Category::by_id("IAB17").is_none());
        assert!(Category::by_id("").is_none());
    }

    #[test]
    fn test_resolve_exact_id() {
        let cat = Category::resolve("3", "whatever");
        assert_eq!(cat.name, "Technology & Science");
    }

    #[test]
    fn test_resolve_legacy_by_name() {
        // Legacy "IABnn" ids are unknown, but a matching label maps over.
        let cat = Category::resolve("IAB17", "Sports");
        assert_eq!(cat.id, "11");

        let cat = Category::resolve("IAB22", "shopping");
        assert_eq!(cat.id, "10");
    }

    #[test]
    fn test_resolve_unknown_defaults_to_uncategorized() {
        let cat = Category::resolve("IAB16", "Pets");
        assert_eq!(cat.id, UNCATEGORIZED_ID);
        assert_eq!(cat.name, "Uncategorized");
    }

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<_> = CATALOG.iter().map(|(id, _, _)| *id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), CATALOG.len());
    }
}
