//! Mail store collaborator interface.
//!
//! The export engine only talks to a mail store through these traits, so
//! the same traversal runs against a Maildir, a mail client bridge, or the
//! in-memory fixture used by the tests.
//!
//! Folder and item handles are borrows of the store session: they cannot
//! outlive it, and everything is released when the session is dropped.

pub mod maildir;
pub mod memory;
pub mod query;

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::StoreError;

pub use query::ItemQuery;

/// Extension used for exported items unless a backend says otherwise.
pub const DEFAULT_EXPORT_EXTENSION: &str = "msg";

/// Classification prefix shared by plain mail messages.
pub const MAIL_CLASS_PREFIX: &str = "IPM.Note";

/// Well-known folders every store can look up by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultFolder {
    Inbox,
    SentItems,
    DeletedItems,
}

impl DefaultFolder {
    /// All roles, in lookup order.
    pub const ALL: [DefaultFolder; 3] = [Self::Inbox, Self::SentItems, Self::DeletedItems];

    /// The alias used for this role as the first segment of a folder path.
    pub fn alias(self) -> &'static str {
        match self {
            Self::Inbox => "Inbox",
            Self::SentItems => "Sent Items",
            Self::DeletedItems => "Deleted Items",
        }
    }

    /// Resolve a folder path segment to a role (ASCII case-insensitive).
    pub fn from_alias(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.alias().eq_ignore_ascii_case(segment.trim()))
    }
}

/// An open mail store session.
pub trait MailStore {
    /// The store's root folder. Its children are the top-level folders.
    fn root(&mut self) -> &mut dyn MailFolder;

    /// Look up a well-known folder by role.
    fn default_folder(&mut self, role: DefaultFolder) -> Option<&mut dyn MailFolder>;

    /// File extension of the lossless single-message format `save_as` writes.
    fn export_extension(&self) -> &'static str {
        DEFAULT_EXPORT_EXTENSION
    }
}

/// A folder in the store's tree.
pub trait MailFolder {
    fn name(&self) -> &str;

    /// Immediate subfolders.
    fn children(&mut self) -> Vec<&mut dyn MailFolder>;

    /// Immediate subfolder with exactly this (case-sensitive) name.
    fn child(&mut self, name: &str) -> Option<&mut dyn MailFolder> {
        self.children().into_iter().find(|f| f.name() == name)
    }

    /// Run `query` against this folder's items.
    fn find_items(&mut self, query: &ItemQuery) -> Result<Box<dyn ItemView + '_>, StoreError>;
}

/// Result of an item query: counted and addressable by position.
///
/// A view may be live, in which case items that stop matching (for example
/// after their tags are rewritten and saved) disappear from it and the
/// positions of the items after them shift down.
pub trait ItemView {
    fn count(&self) -> usize;

    fn item(&mut self, index: usize) -> Result<&mut dyn MailItem, StoreError>;
}

/// A single item in a mail store.
pub trait MailItem {
    /// The `Message-ID`, if the item has one.
    fn message_id(&self) -> Option<&str>;

    /// Store-local entry identifier.
    fn entry_id(&self) -> &str;

    fn received(&self) -> DateTime<Utc>;

    fn subject(&self) -> &str;

    fn sender_name(&self) -> &str;

    /// Item classification, e.g. `IPM.Note` or `IPM.Schedule.Meeting.Request`.
    fn message_class(&self) -> &str;

    /// The delimited tag-set string.
    fn categories(&self) -> &str;

    /// Replace the tag set in memory. Takes effect on [`MailItem::save`].
    fn set_categories(&mut self, categories: String);

    /// Persist in-memory changes to the store.
    fn save(&mut self) -> Result<(), StoreError>;

    /// Write the item to `path` in the store's lossless single-message format.
    fn save_as(&self, path: &Path) -> Result<(), StoreError>;

    /// Whether this item is a plain mail message (not a meeting request,
    /// receipt or report that happens to carry the tag).
    fn is_mail(&self) -> bool {
        is_mail_class(self.message_class())
    }
}

/// Prefix match of a classification string against the mail family.
pub fn is_mail_class(class: &str) -> bool {
    class
        .get(..MAIL_CLASS_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(MAIL_CLASS_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_folder_aliases() {
        assert_eq!(DefaultFolder::from_alias("Inbox"), Some(DefaultFolder::Inbox));
        assert_eq!(DefaultFolder::from_alias("inbox"), Some(DefaultFolder::Inbox));
        assert_eq!(
            DefaultFolder::from_alias("Sent Items"),
            Some(DefaultFolder::SentItems)
        );
        assert_eq!(
            DefaultFolder::from_alias("Deleted Items"),
            Some(DefaultFolder::DeletedItems)
        );
        assert_eq!(DefaultFolder::from_alias("Projects"), None);
    }

    #[test]
    fn test_mail_class_prefix() {
        assert!(is_mail_class("IPM.Note"));
        assert!(is_mail_class("IPM.Note.SMIME.MultipartSigned"));
        assert!(is_mail_class("ipm.note"));
        assert!(!is_mail_class("IPM.Schedule.Meeting.Request"));
        assert!(!is_mail_class("REPORT.IPM.Note.NDR"));
        assert!(!is_mail_class("IPM"));
    }
}
