//! Structured item query.
//!
//! An [`ItemQuery`] is a conjunction of a tag-substring test and an
//! optional received-time cutoff. Backends either evaluate it in-process
//! with [`ItemQuery::matches`] or hand [`ItemQuery::render`] to a query
//! engine that speaks the textual filter language.

use std::fmt;

use chrono::{DateTime, Utc};

/// Property addressed by the tag test in rendered filters.
pub const KEYWORDS_PROPERTY: &str = "urn:schemas-microsoft-com:office:office#Keywords";

/// Property addressed by the received-time test in rendered filters.
pub const RECEIVED_PROPERTY: &str = "urn:schemas:httpmail:datereceived";

/// Selects items carrying a tag and, optionally, received before a cutoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuery {
    /// Tag that must occur as a substring of the item's tag-set string.
    pub categories_contain: String,
    /// Inclusive upper bound on the received time.
    pub received_on_or_before: Option<DateTime<Utc>>,
}

impl ItemQuery {
    /// Evaluate the predicate against an item's fields.
    ///
    /// The tag test is a case-insensitive substring match, the same
    /// semantics as `LIKE '%tag%'` on the keywords property.
    pub fn matches(&self, categories: &str, received: DateTime<Utc>) -> bool {
        let tag_ok = categories
            .to_lowercase()
            .contains(&self.categories_contain.to_lowercase());
        let age_ok = self
            .received_on_or_before
            .is_none_or(|cutoff| received <= cutoff);
        tag_ok && age_ok
    }

    /// Render the query as a textual filter (`@SQL=` style, without the
    /// prefix). Single quotes inside literals are doubled.
    pub fn render(&self) -> String {
        let mut out = format!(
            "\"{KEYWORDS_PROPERTY}\" LIKE '%{}%'",
            escape_literal(&self.categories_contain)
        );
        if let Some(cutoff) = self.received_on_or_before {
            out.push_str(&format!(
                " AND \"{RECEIVED_PROPERTY}\" <= '{}'",
                cutoff.format("%Y-%m-%d %H:%M:%S")
            ));
        }
        out
    }
}

impl fmt::Display for ItemQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Escape a value for use inside a single-quoted filter literal.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_matches_substring_of_tag_string() {
        let q = ItemQuery {
            categories_contain: "Archive".into(),
            received_on_or_before: None,
        };
        assert!(q.matches("Red, Archive", at(1)));
        assert!(q.matches("archive", at(1)));
        assert!(!q.matches("Red, Blue", at(1)));
        assert!(!q.matches("", at(1)));
    }

    #[test]
    fn test_matches_cutoff_is_inclusive() {
        let cutoff = at(10);
        let q = ItemQuery {
            categories_contain: "Archive".into(),
            received_on_or_before: Some(cutoff),
        };
        assert!(q.matches("Archive", cutoff));
        assert!(q.matches("Archive", cutoff - Duration::days(1)));
        assert!(!q.matches("Archive", cutoff + Duration::seconds(1)));
    }

    #[test]
    fn test_render_escapes_quotes() {
        let q = ItemQuery {
            categories_contain: "O'Brien's".into(),
            received_on_or_before: None,
        };
        assert_eq!(
            q.render(),
            "\"urn:schemas-microsoft-com:office:office#Keywords\" LIKE '%O''Brien''s%'"
        );
    }

    #[test]
    fn test_render_with_cutoff() {
        let q = ItemQuery {
            categories_contain: "Archive".into(),
            received_on_or_before: Some(at(12)),
        };
        let rendered = q.to_string();
        assert!(rendered.ends_with(
            " AND \"urn:schemas:httpmail:datereceived\" <= '2026-10-12 12:00:00'"
        ));
    }
}
