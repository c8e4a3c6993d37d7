//! Drive the folder processor over configured folders or the whole store.

use tracing::{debug, warn};

use crate::engine::{locator, processor, SweepSettings};
use crate::index::ExportIndex;
use crate::store::{ItemQuery, MailFolder, MailStore};

/// Process the folders named in `folder_specs`, or every folder of the
/// store when the list is empty. Returns the total number exported.
///
/// The caller saves `index` afterwards.
pub fn run(
    store: &mut dyn MailStore,
    folder_specs: &[String],
    query: &ItemQuery,
    index: &mut ExportIndex,
    settings: &SweepSettings,
) -> usize {
    if folder_specs.is_empty() {
        return walk(store.root(), query, index, settings);
    }

    let mut total = 0;
    for spec in folder_specs {
        match locator::locate(store, spec) {
            Some(folder) => total += processor::process_folder(folder, query, index, settings),
            None => warn!(folder = %spec, "Configured folder not found, skipping"),
        }
    }
    total
}

/// Depth-first over `folder` and all of its descendants.
fn walk(
    folder: &mut dyn MailFolder,
    query: &ItemQuery,
    index: &mut ExportIndex,
    settings: &SweepSettings,
) -> usize {
    debug!(folder = folder.name(), "Visiting folder");
    let mut total = processor::process_folder(folder, query, index, settings);
    for child in folder.children() {
        total += walk(child, query, index, settings);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{MemoryFolder, MemoryItem, MemoryStore};
    use crate::store::DefaultFolder;

    fn settings(root: &std::path::Path) -> SweepSettings {
        SweepSettings {
            export_root: root.to_path_buf(),
            archive_tag: "Archive".into(),
            post_export_tag: None,
            compute_content_hash: false,
            extension: "msg".into(),
        }
    }

    fn query() -> ItemQuery {
        ItemQuery {
            categories_contain: "Archive".into(),
            received_on_or_before: None,
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_default_folder(
                DefaultFolder::Inbox,
                MemoryFolder::new("Inbox")
                    .with_item(MemoryItem::new("i1", "one").tagged("Archive"))
                    .with_child(
                        MemoryFolder::new("Deep")
                            .with_item(MemoryItem::new("d1", "deep").tagged("Archive")),
                    ),
            )
            .with_folder(
                MemoryFolder::new("Projects")
                    .with_item(MemoryItem::new("p1", "proj").tagged("Archive"))
                    .with_item(MemoryItem::new("p2", "untagged")),
            )
    }

    #[test]
    fn test_full_walk_reaches_nested_folders() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store();
        let mut index = ExportIndex::empty(dir.path().join("i.json"));
        assert_eq!(run(&mut store, &[], &query(), &mut index, &settings(dir.path())), 3);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_configured_folders_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store();
        let mut index = ExportIndex::empty(dir.path().join("i.json"));
        let specs = vec!["Projects".to_string(), "Inbox/Missing".to_string(), "Inbox/Deep".to_string()];
        assert_eq!(run(&mut store, &specs, &query(), &mut index, &settings(dir.path())), 2);
        assert!(index.contains(&crate::model::identity::IdentityKey::derive(None, "d1")));
        assert!(!index.contains(&crate::model::identity::IdentityKey::derive(None, "i1")));
    }
}
