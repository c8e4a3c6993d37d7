//! In-memory mail store.
//!
//! Builds a folder tree from plain values so the export engine can be run
//! without a mail client. Query results are live views: an item whose
//! saved tags stop matching drops out of the view immediately, the way a
//! mail client's restricted item collection behaves.
//!
//! Items can be told to fail on export or on save, to exercise the
//! engine's failure isolation.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::store::{DefaultFolder, ItemQuery, ItemView, MailFolder, MailItem, MailStore};

/// A mail store held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    root: MemoryFolder,
    roles: Vec<(DefaultFolder, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level folder.
    pub fn with_folder(mut self, folder: MemoryFolder) -> Self {
        self.root.children.push(folder);
        self
    }

    /// Map a well-known role to the top-level folder called `name`.
    pub fn with_default(mut self, role: DefaultFolder, name: &str) -> Self {
        self.roles.retain(|(r, _)| *r != role);
        self.roles.push((role, name.to_string()));
        self
    }

    /// Add a top-level folder and register it for `role`.
    pub fn with_default_folder(self, role: DefaultFolder, folder: MemoryFolder) -> Self {
        let name = folder.name.clone();
        self.with_folder(folder).with_default(role, &name)
    }

    /// Follow a path of folder names from the root.
    pub fn folder(&self, path: &[&str]) -> Option<&MemoryFolder> {
        path.iter().try_fold(&self.root, |folder, name| {
            folder.children.iter().find(|c| c.name == *name)
        })
    }

    pub fn folder_mut(&mut self, path: &[&str]) -> Option<&mut MemoryFolder> {
        path.iter().try_fold(&mut self.root, |folder, name| {
            folder.children.iter_mut().find(|c| c.name == *name)
        })
    }

    /// Every item in the tree, depth-first.
    pub fn all_items(&self) -> Vec<&MemoryItem> {
        fn collect<'a>(folder: &'a MemoryFolder, out: &mut Vec<&'a MemoryItem>) {
            out.extend(folder.items.iter());
            for child in &folder.children {
                collect(child, out);
            }
        }
        let mut out = Vec::new();
        collect(&self.root, &mut out);
        out
    }
}

impl MailStore for MemoryStore {
    fn root(&mut self) -> &mut dyn MailFolder {
        &mut self.root
    }

    fn default_folder(&mut self, role: DefaultFolder) -> Option<&mut dyn MailFolder> {
        let name = self
            .roles
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, name)| name.clone())?;
        self.root
            .children
            .iter_mut()
            .find(|c| c.name == name)
            .map(|c| c as &mut dyn MailFolder)
    }
}

/// A folder of the in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryFolder {
    name: String,
    items: Vec<MemoryItem>,
    children: Vec<MemoryFolder>,
    reject_queries: bool,
}

impl MemoryFolder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_item(mut self, item: MemoryItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_child(mut self, child: MemoryFolder) -> Self {
        self.children.push(child);
        self
    }

    /// Make every query against this folder fail.
    pub fn rejecting_queries(mut self) -> Self {
        self.reject_queries = true;
        self
    }

    pub fn items(&self) -> &[MemoryItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<MemoryItem> {
        &mut self.items
    }

    pub fn item(&self, entry_id: &str) -> Option<&MemoryItem> {
        self.items.iter().find(|i| i.entry_id == entry_id)
    }
}

impl MailFolder for MemoryFolder {
    fn name(&self) -> &str {
        &self.name
    }

    fn children(&mut self) -> Vec<&mut dyn MailFolder> {
        self.children
            .iter_mut()
            .map(|c| c as &mut dyn MailFolder)
            .collect()
    }

    fn find_items(&mut self, query: &ItemQuery) -> Result<Box<dyn ItemView + '_>, StoreError> {
        if self.reject_queries {
            return Err(StoreError::QueryFailed {
                folder: self.name.clone(),
                reason: "folder does not support this filter".to_string(),
            });
        }
        Ok(Box::new(LiveView {
            items: &mut self.items,
            query: query.clone(),
        }))
    }
}

/// Live query result over a folder's items.
struct LiveView<'a> {
    items: &'a mut Vec<MemoryItem>,
    query: ItemQuery,
}

impl ItemView for LiveView<'_> {
    fn count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| self.query.matches(&i.categories, i.received))
            .count()
    }

    fn item(&mut self, index: usize) -> Result<&mut dyn MailItem, StoreError> {
        let query = &self.query;
        self.items
            .iter_mut()
            .filter(|i| query.matches(&i.categories, i.received))
            .nth(index)
            .map(|i| i as &mut dyn MailItem)
            .ok_or(StoreError::ItemNotFound(index))
    }
}

/// An item of the in-memory store.
///
/// Tag changes are staged by [`MailItem::set_categories`] and only reach
/// the stored tag set (the one queries see) on a successful save.
#[derive(Debug, Clone)]
pub struct MemoryItem {
    message_id: Option<String>,
    entry_id: String,
    received: DateTime<Utc>,
    subject: String,
    sender_name: String,
    message_class: String,
    categories: String,
    staged: Option<String>,
    content: Vec<u8>,
    fail_export: bool,
    fail_save: bool,
    saves: usize,
}

impl MemoryItem {
    /// A plain mail item received now, with no tags.
    pub fn new(entry_id: &str, subject: &str) -> Self {
        Self {
            message_id: None,
            entry_id: entry_id.to_string(),
            received: Utc::now(),
            subject: subject.to_string(),
            sender_name: String::new(),
            message_class: "IPM.Note".to_string(),
            categories: String::new(),
            staged: None,
            content: format!("Subject: {subject}\r\n\r\n").into_bytes(),
            fail_export: false,
            fail_save: false,
            saves: 0,
        }
    }

    pub fn message_id(mut self, message_id: &str) -> Self {
        self.message_id = Some(message_id.to_string());
        self
    }

    pub fn received_at(mut self, received: DateTime<Utc>) -> Self {
        self.received = received;
        self
    }

    pub fn sender(mut self, sender_name: &str) -> Self {
        self.sender_name = sender_name.to_string();
        self
    }

    pub fn class(mut self, message_class: &str) -> Self {
        self.message_class = message_class.to_string();
        self
    }

    pub fn tagged(mut self, categories: &str) -> Self {
        self.categories = categories.to_string();
        self
    }

    pub fn content(mut self, content: &[u8]) -> Self {
        self.content = content.to_vec();
        self
    }

    /// Make `save_as` fail without writing anything.
    pub fn failing_export(mut self) -> Self {
        self.fail_export = true;
        self
    }

    /// Make `save` fail. The stored tags stay as they were and staged
    /// edits are discarded.
    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    /// The tag set as last saved.
    pub fn stored_categories(&self) -> &str {
        &self.categories
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves
    }

    /// Change the stored tag set directly, as another client would.
    pub fn set_stored_categories(&mut self, categories: &str) {
        self.categories = categories.to_string();
        self.staged = None;
    }
}

impl MailItem for MemoryItem {
    fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    fn entry_id(&self) -> &str {
        &self.entry_id
    }

    fn received(&self) -> DateTime<Utc> {
        self.received
    }

    fn subject(&self) -> &str {
        &self.subject
    }

    fn sender_name(&self) -> &str {
        &self.sender_name
    }

    fn message_class(&self) -> &str {
        &self.message_class
    }

    fn categories(&self) -> &str {
        self.staged.as_deref().unwrap_or(&self.categories)
    }

    fn set_categories(&mut self, categories: String) {
        self.staged = Some(categories);
    }

    fn save(&mut self) -> Result<(), StoreError> {
        if self.fail_save {
            self.staged = None;
            return Err(StoreError::SaveFailed {
                entry_id: self.entry_id.clone(),
                reason: "simulated save failure".to_string(),
            });
        }
        if let Some(staged) = self.staged.take() {
            self.categories = staged;
        }
        self.saves += 1;
        Ok(())
    }

    fn save_as(&self, path: &Path) -> Result<(), StoreError> {
        if self.fail_export {
            return Err(StoreError::ExportFailed {
                path: path.to_path_buf(),
                reason: "simulated write failure".to_string(),
            });
        }
        std::fs::write(path, &self.content).map_err(|e| StoreError::io(path, e))
    }
}
