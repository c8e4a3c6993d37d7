//! Delimited tag-set strings (categories / keywords).
//!
//! Mail stores keep an item's tags as one string such as
//! `"Archive, Project X"`. Entries may be separated by `,` or `;`.

use std::fmt;

/// Separator used when a tag set is written back.
pub const TAG_SEPARATOR: &str = ", ";

/// An ordered, case-insensitively deduplicated set of tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    /// Parse a delimited tag string. Blank entries are dropped.
    pub fn parse(raw: &str) -> Self {
        let mut set = Self::default();
        for tag in raw.split([',', ';']) {
            set.insert(tag);
        }
        set
    }

    /// Add a tag unless an equal one (ignoring ASCII case) is present.
    pub fn insert(&mut self, tag: &str) {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return;
        }
        self.tags.push(tag.to_string());
    }

    /// Remove every tag equal to `tag`, ignoring ASCII case.
    pub fn remove(&mut self, tag: &str) {
        let tag = tag.trim();
        self.tags.retain(|t| !t.eq_ignore_ascii_case(tag));
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag.trim()))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tags.join(TAG_SEPARATOR))
    }
}

/// Move an item from the archive tag to the post-export tag.
///
/// Returns the rewritten tag string; other tags keep their order.
pub fn retag(current: &str, archive_tag: &str, post_export_tag: &str) -> String {
    let mut set = TagSet::parse(current);
    set.remove(archive_tag);
    set.insert(post_export_tag);
    set.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_separators() {
        let set = TagSet::parse("Archive; Red ,  , Project X");
        assert_eq!(set.iter().collect::<Vec<_>>(), ["Archive", "Red", "Project X"]);
    }

    #[test]
    fn test_parse_dedups_case_insensitively() {
        let set = TagSet::parse("Red, red, RED");
        assert_eq!(set.to_string(), "Red");
    }

    #[test]
    fn test_retag_replaces_archive_tag() {
        assert_eq!(retag("Red, Archive, Blue", "Archive", "Archived"), "Red, Blue, Archived");
    }

    #[test]
    fn test_retag_when_post_tag_already_present() {
        assert_eq!(retag("Archived; archive", "Archive", "Archived"), "Archived");
    }

    #[test]
    fn test_retag_empty() {
        assert_eq!(retag("", "Archive", "Archived"), "Archived");
        assert!(TagSet::parse(" ; , ").is_empty());
    }
}
