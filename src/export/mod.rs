//! CSV export for datasets.
//!
//! Four columns: RFC 3339 timestamp (empty when the record has none), the
//! query double-quoted with internal quotes doubled, category id, category
//! name. Rows are newline-terminated with no trailing metadata. The category
//! name is the last column, so commas inside it survive re-parsing.

use crate::models::ActivityRecord;

const CSV_HEADER: &str = "Timestamp,Query,Category ID,Category Name";

/// Render a record array as CSV text.
pub fn render_csv(records: &[ActivityRecord]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for record in records {
        out.push_str(record.timestamp.as_deref().unwrap_or(""));
        out.push_str(",\"");
        out.push_str(&record.query.replace('"', "\"\""));
        out.push_str("\",");
        out.push_str(&record.category.id);
        out.push(',');
        out.push_str(&record.category.name);
        out.push('\n');
    }

    out
}
