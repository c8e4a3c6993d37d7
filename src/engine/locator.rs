//! Resolve folder path strings against a store's folder tree.
//!
//! `"Inbox/Projects/2026"`: the first segment is tried as a default-folder
//! alias (`Inbox`, `Sent Items`, `Deleted Items`), then as the name of a
//! top-level folder; later segments must name an immediate child exactly.

use crate::store::{DefaultFolder, MailFolder, MailStore};

/// Separators accepted between path segments.
pub const PATH_SEPARATORS: [char; 2] = ['/', '\\'];

/// Split a folder path into its non-blank, trimmed segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split(PATH_SEPARATORS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Find the folder `path` refers to. `None` as soon as a segment is missing.
pub fn locate<'s>(store: &'s mut dyn MailStore, path: &str) -> Option<&'s mut dyn MailFolder> {
    let segments = segments(path);
    let (first, rest) = segments.split_first()?;

    let mut folder = match DefaultFolder::from_alias(first) {
        Some(role) => store.default_folder(role)?,
        None => store.root().child(first)?,
    };
    for segment in rest {
        folder = folder.child(segment)?;
    }
    Some(folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{MemoryFolder, MemoryStore};

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_default_folder(
                DefaultFolder::Inbox,
                MemoryFolder::new("Posteingang")
                    .with_child(MemoryFolder::new("Projects").with_child(MemoryFolder::new("2026"))),
            )
            .with_default_folder(DefaultFolder::SentItems, MemoryFolder::new("Gesendet"))
            .with_folder(MemoryFolder::new("Archive").with_child(MemoryFolder::new("Old")))
    }

    #[test]
    fn test_segments() {
        assert_eq!(segments("Inbox\\Projects/ 2026 "), ["Inbox", "Projects", "2026"]);
        assert_eq!(segments("//Inbox//"), ["Inbox"]);
        assert!(segments("  ").is_empty());
    }

    #[test]
    fn test_alias_resolves_default_folder() {
        let mut store = store();
        assert_eq!(locate(&mut store, "Inbox").unwrap().name(), "Posteingang");
        assert_eq!(locate(&mut store, "sent items").unwrap().name(), "Gesendet");
        assert_eq!(locate(&mut store, "Inbox/Projects/2026").unwrap().name(), "2026");
    }

    #[test]
    fn test_top_level_name_fallback() {
        let mut store = store();
        assert_eq!(locate(&mut store, "Archive\\Old").unwrap().name(), "Old");
        assert_eq!(locate(&mut store, "Posteingang").unwrap().name(), "Posteingang");
    }

    #[test]
    fn test_not_found() {
        let mut store = store();
        assert!(locate(&mut store, "").is_none());
        assert!(locate(&mut store, "Deleted Items").is_none());
        assert!(locate(&mut store, "archive").is_none());
        assert!(locate(&mut store, "Inbox/projects").is_none());
        assert!(locate(&mut store, "Inbox/Projects/2026/Q1").is_none());
    }
}
