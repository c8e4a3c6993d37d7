//! Per-folder export: query, dedup, write, record, re-tag.

use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::engine::SweepSettings;
use crate::export::{digest, naming};
use crate::index::{ExportIndex, ExportRecord};
use crate::model::identity::IdentityKey;
use crate::model::tags;
use crate::store::{ItemQuery, MailFolder, MailItem};

/// Date format of archive directories and file name prefixes.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// What happened to one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Not a plain mail message; left alone.
    NotMail,
    /// The index already holds a record for this identity.
    AlreadyExported,
    /// Writing the file failed; the item is not indexed and will be retried.
    ExportFailed,
    /// Written and indexed. `retagged` is false if re-tagging was disabled
    /// or failed.
    Exported { retagged: bool },
}

/// Export every matching item of `folder` that is not in `index` yet.
///
/// Returns the number of items written and indexed. A failing query makes
/// the folder contribute zero; a failing item never stops its siblings.
pub fn process_folder(
    folder: &mut dyn MailFolder,
    query: &ItemQuery,
    index: &mut ExportIndex,
    settings: &SweepSettings,
) -> usize {
    let folder_name = folder.name().to_string();
    let mut view = match folder.find_items(query) {
        Ok(view) => view,
        Err(e) => {
            warn!(folder = %folder_name, error = %e, "Item query failed, skipping folder");
            return 0;
        }
    };

    let matches = view.count();
    debug!(folder = %folder_name, matches, "Processing folder");

    // Last to first: exporting or re-tagging can drop an item out of a
    // live view, which only shifts the positions after it.
    let mut exported = 0;
    for position in (0..matches).rev() {
        let item = match view.item(position) {
            Ok(item) => item,
            Err(e) => {
                warn!(folder = %folder_name, position, error = %e, "Cannot open item");
                continue;
            }
        };
        if let ItemOutcome::Exported { .. } = export_item(item, index, settings) {
            exported += 1;
        }
    }

    if exported > 0 {
        info!(folder = %folder_name, exported, "Folder processed");
    }
    exported
}

/// Export one item, record it and move it to the post-export tag.
pub fn export_item(
    item: &mut dyn MailItem,
    index: &mut ExportIndex,
    settings: &SweepSettings,
) -> ItemOutcome {
    if !item.is_mail() {
        debug!(class = item.message_class(), subject = item.subject(), "Skipping non-mail item");
        return ItemOutcome::NotMail;
    }

    let key = IdentityKey::of(item);
    if index.contains(&key) {
        debug!(identity = %key, "Already exported");
        return ItemOutcome::AlreadyExported;
    }

    let date = item
        .received()
        .with_timezone(&Local)
        .format(DATE_FORMAT)
        .to_string();
    let path = match naming::resolve(
        &settings.export_root,
        &date,
        item.sender_name(),
        item.subject(),
        &settings.extension,
    ) {
        Ok(path) => path,
        Err(e) => {
            error!(identity = %key, subject = item.subject(), error = %e, "Cannot prepare archive folder");
            return ItemOutcome::ExportFailed;
        }
    };

    if let Err(e) = item.save_as(&path) {
        error!(
            identity = %key,
            subject = item.subject(),
            path = %path.display(),
            error = %e,
            "Export failed, item will be retried next run"
        );
        // The path was free when resolved, so anything there is our partial write.
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "Cannot remove partial export");
            }
        }
        return ItemOutcome::ExportFailed;
    }

    let content_hash = if settings.compute_content_hash {
        match digest::sha256_file(&path) {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot hash exported file");
                None
            }
        }
    } else {
        None
    };

    info!(identity = %key, path = %path.display(), "Exported");
    index.record(key.clone(), ExportRecord::new(path, content_hash));

    let retagged = match settings.post_export_tag.as_deref() {
        Some(post_tag) => retag(item, &settings.archive_tag, post_tag, &key),
        None => false,
    };
    ItemOutcome::Exported { retagged }
}

/// Swap the archive tag for `post_tag` and save. Failures are only logged:
/// the export and its record stand either way.
fn retag(item: &mut dyn MailItem, archive_tag: &str, post_tag: &str, key: &IdentityKey) -> bool {
    let updated = tags::retag(item.categories(), archive_tag, post_tag);
    item.set_categories(updated);
    match item.save() {
        Ok(()) => true,
        Err(e) => {
            warn!(
                identity = %key,
                subject = item.subject(),
                error = %e,
                "Exported but re-tagging failed; item stays recorded as exported"
            );
            false
        }
    }
}
