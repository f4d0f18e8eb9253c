//! Google Takeout "My Activity" HTML parser.
//!
//! Extracts normalized activity records from the export markup. Each search
//! entry is a content block containing the literal "Searched for" marker
//! followed by a hyperlink whose text is the query. Parsing is record-local:
//! a malformed entry degrades that one record instead of aborting the batch,
//! and a document with no matching blocks yields an empty list.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::{ActivityRecord, Coords};

/// Marker phrase preceding the query hyperlink ("Searched for" + NBSP).
const SEARCH_MARKER: &str = "Searched for\u{00a0}";

/// Date-time pattern used by the export, after timezone stripping.
const EXPORT_TIMESTAMP_FORMAT: &str = "%b %d, %Y, %I:%M:%S %p";

/// Parse the full export document into activity records, in document order.
///
/// Every matched entry block produces exactly one record. Ids are left unset
/// so the store assigns fresh keys on insert.
pub fn parse_activity_html(html: &str) -> Vec<ActivityRecord> {
    let document = Html::parse_document(html);

    let entry_selector = Selector::parse("div.content-cell.mdl-typography--body-1")
        .expect("static entry selector");
    let caption_selector = Selector::parse("div.content-cell.mdl-typography--caption")
        .expect("static caption selector");
    let anchor_selector = Selector::parse("a").expect("static anchor selector");

    document
        .select(&entry_selector)
        .filter(|div| div.text().collect::<String>().contains(SEARCH_MARKER))
        .map(|entry| {
            let anchor = entry.select(&anchor_selector).next();
            let query = anchor
                .map(|a| a.text().collect::<String>().trim().to_string())
                .unwrap_or_default();

            let timestamp = timestamp_text(&entry, anchor).and_then(|raw| {
                let parsed = parse_export_timestamp(&raw);
                if parsed.is_none() {
                    tracing::warn!(text = %raw, "unparsable timestamp, keeping record without one");
                }
                parsed
            });

            let coords = sibling_caption(&entry, &caption_selector)
                .map(|caption| extract_coords(&caption))
                .unwrap_or_default();

            ActivityRecord::new(query, timestamp, coords)
        })
        .collect()
}

/// The first non-empty text chunk following the query hyperlink within an
/// entry block. Text before the hyperlink (the marker phrase) is skipped.
fn timestamp_text(entry: &ElementRef, anchor: Option<ElementRef>) -> Option<String> {
    let anchor = anchor?;
    let mut seen_link = false;
    for child in entry.children() {
        if !seen_link {
            if child.id() == anchor.id() {
                seen_link = true;
            }
            continue;
        }
        if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// The caption block belonging to an entry, found inside the same enclosing
/// cell. Containment keeps the pairing correct even when some entries carry
/// no caption at all.
fn sibling_caption<'a>(
    entry: &ElementRef<'a>,
    caption_selector: &Selector,
) -> Option<ElementRef<'a>> {
    let parent = entry.parent().and_then(ElementRef::wrap)?;
    parent.select(caption_selector).next()
}

/// Parse the export's timestamp text into an RFC 3339 instant.
///
/// Non-breaking spaces are normalized and a trailing timezone abbreviation
/// (2-4 uppercase letters, e.g. "CET") is stripped before matching the fixed
/// export pattern. Returns `None` when the text does not match.
fn parse_export_timestamp(raw: &str) -> Option<String> {
    let normalized: String = raw
        .chars()
        .map(|c| match c {
            '\u{00a0}' | '\u{202f}' => ' ',
            other => other,
        })
        .collect();
    let stripped = strip_timezone(normalized.trim());

    let naive = NaiveDateTime::parse_from_str(stripped, EXPORT_TIMESTAMP_FORMAT).ok()?;
    let instant = DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc);
    Some(instant.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Strip a trailing timezone abbreviation token, leaving the AM/PM marker
/// untouched.
fn strip_timezone(text: &str) -> &str {
    if let Some((head, tail)) = text.rsplit_once(' ') {
        let is_abbrev = (2..=4).contains(&tail.len())
            && tail.chars().all(|c| c.is_ascii_uppercase())
            && tail != "AM"
            && tail != "PM";
        if is_abbrev {
            return head.trim_end();
        }
    }
    text
}

/// Read geo coordinates from a caption block's map hyperlink, if present.
/// Both components default to empty strings when unavailable.
fn extract_coords(caption: &ElementRef) -> Coords {
    let maps_selector = Selector::parse(r#"a[href*="maps"]"#).expect("static maps selector");

    let center = caption
        .select(&maps_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| Url::parse(href).ok())
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "center")
                .map(|(_, value)| value.into_owned())
        });

    match center {
        Some(center) => {
            let mut parts = center.splitn(2, ',');
            Coords {
                lat: parts.next().unwrap_or_default().to_string(),
                lon: parts.next().unwrap_or_default().to_string(),
            }
        }
        None => Coords::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One export cell: the entry block plus an optional caption block, under
    /// a shared outer cell as in the real markup.
    fn cell(entry_body: &str, caption_body: Option<&str>) -> String {
        let caption = caption_body
            .map(|body| {
                format!(
                    r#"<div class="content-cell mdl-typography--caption">{}</div>"#,
                    body
                )
            })
            .unwrap_or_default();
        format!(
            r#"<div class="outer-cell mdl-cell"><div class="content-cell mdl-typography--body-1">{}</div>{}</div>"#,
            entry_body, caption
        )
    }

    fn export_document(cells: &[String]) -> String {
        format!("<html><body>{}</body></html>", cells.concat())
    }

    #[test]
    fn test_parses_entries_in_document_order() {
        let html = export_document(&[
            cell(
                "Searched for\u{00a0}<a href=\"https://www.google.com/search?q=rust\">rust borrow checker</a><br>Jan 5, 2023, 3:04:05 PM CET",
                None,
            ),
            cell(
                "Searched for\u{00a0}<a href=\"https://www.google.com/search?q=sqlite\">sqlite wal mode</a><br>Jan 4, 2023, 9:15:00 AM CET",
                None,
            ),
        ]);

        let records = parse_activity_html(&html);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].query, "rust borrow checker");
        assert_eq!(records[1].query, "sqlite wal mode");
        assert_eq!(records[0].timestamp.as_deref(), Some("2023-01-05T15:04:05Z"));
        assert_eq!(records[1].timestamp.as_deref(), Some("2023-01-04T09:15:00Z"));
        assert!(records.iter().all(|r| r.id.is_none()));
        assert!(records.iter().all(|r| r.category.name == "Uncategorized"));
    }

    #[test]
    fn test_bad_timestamp_keeps_record() {
        let html = export_document(&[
            cell(
                "Searched for\u{00a0}<a href=\"#\">first</a><br>Jan 5, 2023, 3:04:05 PM CET",
                None,
            ),
            cell("Searched for\u{00a0}<a href=\"#\">second</a><br>garbage", None),
            cell(
                "Searched for\u{00a0}<a href=\"#\">third</a><br>Dec 31, 2019, 11:59:59 PM",
                None,
            ),
        ]);

        let records = parse_activity_html(&html);
        assert_eq!(records.len(), 3);
        assert!(records[0].timestamp.is_some());
        assert!(records[1].timestamp.is_none());
        assert_eq!(records[1].query, "second");
        assert_eq!(records[2].timestamp.as_deref(), Some("2019-12-31T23:59:59Z"));
    }

    #[test]
    fn test_non_matching_document_yields_empty() {
        let html = "<html><body><div class=\"content-cell mdl-typography--body-1\">Visited\u{00a0}<a href=\"#\">a page</a></div></body></html>";
        assert!(parse_activity_html(html).is_empty());
    }

    #[test]
    fn test_entry_without_anchor_has_empty_query() {
        let html = export_document(&[cell("Searched for\u{00a0}something plain", None)]);
        let records = parse_activity_html(&html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].query, "");
        assert!(records[0].timestamp.is_none());
    }

    #[test]
    fn test_coords_from_caption_map_link() {
        let html = export_document(&[
            cell(
                "Searched for\u{00a0}<a href=\"#\">coffee near me</a><br>Jun 1, 2022, 8:00:00 AM CEST",
                Some(
                    "<b>Locations:</b> <a href=\"https://www.google.com/maps/@?api=1&amp;map_action=map&amp;center=52.1205,11.6276&amp;zoom=12\">From your places (Home)</a>",
                ),
            ),
        ]);

        let records = parse_activity_html(&html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].coords.lat, "52.1205");
        assert_eq!(records[0].coords.lon, "11.6276");
    }

    #[test]
    fn test_caption_without_map_link_gives_empty_coords() {
        let html = export_document(&[cell(
            "Searched for\u{00a0}<a href=\"#\">weather</a><br>Jun 1, 2022, 8:00:00 AM CEST",
            Some("<b>Products:</b> Search"),
        )]);

        let records = parse_activity_html(&html);
        assert_eq!(records[0].coords, Coords::default());
    }

    #[test]
    fn test_caption_pairing_survives_entries_without_captions() {
        // The first entry has no caption block at all; the second one's
        // coordinates must not shift onto the first record.
        let html = export_document(&[
            cell(
                "Searched for\u{00a0}<a href=\"#\">no caption here</a><br>Jun 1, 2022, 8:00:00 AM CEST",
                None,
            ),
            cell(
                "Searched for\u{00a0}<a href=\"#\">with caption</a><br>Jun 2, 2022, 9:00:00 AM CEST",
                Some(
                    "<a href=\"https://www.google.com/maps/@?api=1&amp;center=48.1371,11.5754\">From your places</a>",
                ),
            ),
        ]);

        let records = parse_activity_html(&html);
        assert_eq!(records[0].coords, Coords::default());
        assert_eq!(records[1].coords.lat, "48.1371");
        assert_eq!(records[1].coords.lon, "11.5754");
    }

    #[test]
    fn test_narrow_nbsp_in_timestamp() {
        // Some exports separate the AM/PM marker with a narrow no-break space.
        let html = export_document(&[cell(
            "Searched for\u{00a0}<a href=\"#\">nbsp handling</a><br>Mar 12, 2024, 7:30:01\u{202f}PM GMT",
            None,
        )]);

        let records = parse_activity_html(&html);
        assert_eq!(records[0].timestamp.as_deref(), Some("2024-03-12T19:30:01Z"));
    }

    #[test]
    fn test_strip_timezone_leaves_am_pm() {
        assert_eq!(
            strip_timezone("Jan 5, 2023, 3:04:05 PM"),
            "Jan 5, 2023, 3:04:05 PM"
        );
        assert_eq!(
            strip_timezone("Jan 5, 2023, 3:04:05 PM CET"),
            "Jan 5, 2023, 3:04:05 PM"
        );
        assert_eq!(
            strip_timezone("Jan 5, 2023, 3:04:05 PM AEST"),
            "Jan 5, 2023, 3:04:05 PM"
        );
    }
}
