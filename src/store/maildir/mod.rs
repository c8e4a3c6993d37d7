//! Maildir++ mail store.
//!
//! The store root is a maildir (`cur/`, `new/`, `tmp/`) and doubles as the
//! `INBOX` folder. Every `.Name` directory that is itself a maildir is a
//! folder; dots in the name express hierarchy, so `.Archive.2024` is the
//! folder `2024` inside `Archive`.
//!
//! Tags live in the `X-Keywords` header. Exports are byte-for-byte copies
//! of the RFC 5322 message.

mod filename;
mod headers;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use mail_parser::{ContentType, HeaderForm, MessageParser, MimeHeaders};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::{
    DefaultFolder, ItemQuery, ItemView, MailFolder, MailItem, MailStore, MAIL_CLASS_PREFIX,
};

pub use filename::MaildirFilename;

const INBOX: &str = "INBOX";
const FOLDER_PREFIX: char = '.';
const KEYWORDS_HEADER: &str = "X-Keywords";

/// Folder names tried, in order, for the roles without a fixed name.
const SENT_NAMES: &[&str] = &["Sent", "Sent Items", "Sent Messages"];
const TRASH_NAMES: &[&str] = &["Trash", "Deleted Items", "Deleted Messages"];

/// An open Maildir++ store.
#[derive(Debug)]
pub struct MaildirStore {
    root: MaildirFolder,
}

impl MaildirStore {
    /// Open the maildir at `path` and load its folder tree.
    ///
    /// Fails with [`StoreError::Unavailable`] if `path` is not a maildir.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !is_maildir(path) {
            return Err(StoreError::Unavailable(format!(
                "'{}' is not a maildir",
                path.display()
            )));
        }

        let mut root = MaildirFolder::virtual_folder("");
        root.children.push(MaildirFolder::real(INBOX, path.to_path_buf()));

        let mut subdirs = Vec::new();
        let entries = fs::read_dir(path).map_err(|e| StoreError::io(path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(path, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(rest) = name.strip_prefix(FOLDER_PREFIX) else {
                continue;
            };
            if rest.is_empty() || rest.starts_with(FOLDER_PREFIX) || !is_maildir(&entry.path()) {
                continue;
            }
            let segments: Vec<String> = rest.split(FOLDER_PREFIX).map(str::to_string).collect();
            subdirs.push((segments, entry.path()));
        }

        // Parents before children, so a real parent is never shadowed by a
        // virtual placeholder created for a deeper folder.
        subdirs.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(&b.0)));
        for (segments, dir) in subdirs {
            root.insert(&segments, dir);
        }

        debug!(path = %path.display(), "Opened maildir");
        Ok(Self { root })
    }
}

impl MailStore for MaildirStore {
    fn root(&mut self) -> &mut dyn MailFolder {
        &mut self.root
    }

    fn default_folder(&mut self, role: DefaultFolder) -> Option<&mut dyn MailFolder> {
        let candidates: &[&str] = match role {
            DefaultFolder::Inbox => &[INBOX],
            DefaultFolder::SentItems => SENT_NAMES,
            DefaultFolder::DeletedItems => TRASH_NAMES,
        };
        let name = candidates
            .iter()
            .find(|name| self.root.children.iter().any(|c| c.name == **name))?;
        self.root
            .children
            .iter_mut()
            .find(|c| c.name == *name)
            .map(|c| c as &mut dyn MailFolder)
    }

    fn export_extension(&self) -> &'static str {
        "eml"
    }
}

/// A maildir folder, or an item-less placeholder in the hierarchy.
#[derive(Debug)]
pub struct MaildirFolder {
    name: String,
    dir: Option<PathBuf>,
    children: Vec<MaildirFolder>,
}

impl MaildirFolder {
    fn real(name: &str, dir: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            dir: Some(dir),
            children: Vec::new(),
        }
    }

    fn virtual_folder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dir: None,
            children: Vec::new(),
        }
    }

    fn insert(&mut self, segments: &[String], dir: PathBuf) {
        let Some((first, rest)) = segments.split_first() else {
            return;
        };
        let pos = match self.children.iter().position(|c| &c.name == first) {
            Some(pos) => pos,
            None => {
                self.children.push(Self::virtual_folder(first));
                self.children.len() - 1
            }
        };
        let child = &mut self.children[pos];
        if rest.is_empty() {
            child.dir = Some(dir);
        } else {
            child.insert(rest, dir);
        }
    }

    fn scan(&self, dir: &Path, query: &ItemQuery) -> Result<Vec<MaildirMessage>, StoreError> {
        let mut messages = Vec::new();
        for sub in ["cur", "new"] {
            let sub_dir = dir.join(sub);
            let entries = fs::read_dir(&sub_dir).map_err(|e| StoreError::QueryFailed {
                folder: self.name.clone(),
                reason: format!("{}: {e}", sub_dir.display()),
            })?;
            for entry in entries.flatten() {
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with('.') || !path.is_file() {
                    continue;
                }
                match MaildirMessage::load(dir, &path, &name) {
                    Ok(msg) if query.matches(&msg.categories, msg.received) => messages.push(msg),
                    Ok(_) => {}
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable message");
                    }
                }
            }
        }
        messages.sort_by(|a, b| {
            a.received
                .cmp(&b.received)
                .then_with(|| a.entry_id.cmp(&b.entry_id))
        });
        Ok(messages)
    }
}

impl MailFolder for MaildirFolder {
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
        let messages = match &self.dir {
            Some(dir) => self.scan(dir, query)?,
            None => Vec::new(),
        };
        Ok(Box::new(SnapshotView { messages }))
    }
}

/// Query result captured when the query ran.
struct SnapshotView {
    messages: Vec<MaildirMessage>,
}

impl ItemView for SnapshotView {
    fn count(&self) -> usize {
        self.messages.len()
    }

    fn item(&mut self, index: usize) -> Result<&mut dyn MailItem, StoreError> {
        self.messages
            .get_mut(index)
            .map(|m| m as &mut dyn MailItem)
            .ok_or(StoreError::ItemNotFound(index))
    }
}

/// A message file in a maildir.
#[derive(Debug)]
pub struct MaildirMessage {
    maildir: PathBuf,
    path: PathBuf,
    filename: MaildirFilename,
    entry_id: String,
    message_id: Option<String>,
    received: DateTime<Utc>,
    subject: String,
    sender_name: String,
    message_class: String,
    categories: String,
    staged: Option<String>,
}

impl MaildirMessage {
    fn load(maildir: &Path, path: &Path, name: &str) -> Result<Self, StoreError> {
        let filename = MaildirFilename::parse(name).ok_or_else(|| StoreError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "not a maildir name"),
        })?;
        let raw = fs::read(path).map_err(|e| StoreError::io(path, e))?;
        let parsed = MessageParser::default().parse_headers(&raw[..]);

        let message_id = parsed
            .as_ref()
            .and_then(|m| m.message_id())
            .map(str::to_string);
        let subject = parsed
            .as_ref()
            .and_then(|m| m.subject())
            .unwrap_or_default()
            .to_string();
        let sender_name = parsed
            .as_ref()
            .and_then(|m| m.from())
            .and_then(|from| from.first())
            .and_then(|addr| addr.name().or(addr.address()))
            .unwrap_or_default()
            .to_string();
        let header_date = parsed
            .as_ref()
            .and_then(|m| m.date())
            .and_then(|d| DateTime::parse_from_rfc3339(&d.to_rfc3339()).ok())
            .map(|d| d.with_timezone(&Utc));

        let received = filename
            .delivered_at()
            .or(header_date)
            .or_else(|| {
                fs::metadata(path)
                    .and_then(|m| m.modified())
                    .ok()
                    .map(DateTime::<Utc>::from)
            })
            .unwrap_or(DateTime::UNIX_EPOCH);

        let message_class = classify(parsed.as_ref().and_then(|m| m.content_type()));
        let categories = parsed
            .as_ref()
            .and_then(|m| {
                m.header_as(KEYWORDS_HEADER, HeaderForm::Text)
                    .into_iter()
                    .find_map(|v| v.as_text().map(|t| t.trim().to_string()))
            })
            .unwrap_or_default();

        Ok(Self {
            maildir: maildir.to_path_buf(),
            path: path.to_path_buf(),
            entry_id: filename.unique.clone(),
            filename,
            message_id,
            received,
            subject,
            sender_name,
            message_class: message_class.to_string(),
            categories,
            staged: None,
        })
    }
}

impl MailItem for MaildirMessage {
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

    /// Rewrite `X-Keywords` via `tmp/` and rename the result over the
    /// message, then to its new `,S=` name if the size is part of it.
    fn save(&mut self) -> Result<(), StoreError> {
        let Some(staged) = self.staged.take() else {
            return Ok(());
        };
        let save_failed = |reason: String| StoreError::SaveFailed {
            entry_id: self.entry_id.clone(),
            reason,
        };

        let raw = fs::read(&self.path).map_err(|e| save_failed(e.to_string()))?;
        let updated = headers::set_header(&raw, KEYWORDS_HEADER, &staged);

        let tmp_path = self
            .maildir
            .join("tmp")
            .join(format!("{}.{}.mailsweep", self.filename.unique, std::process::id()));
        fs::write(&tmp_path, &updated).map_err(|e| save_failed(e.to_string()))?;

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                warn!(path = %tmp_path.display(), error = %cleanup, "Cannot remove temporary file");
            }
            return Err(save_failed(e.to_string()));
        }
        self.categories = staged;

        let new_name = self.filename.with_size(updated.len() as u64);
        let new_path = self.path.with_file_name(new_name.to_string());
        if new_path != self.path {
            match fs::rename(&self.path, &new_path) {
                Ok(()) => {
                    self.path = new_path;
                    self.filename = new_name;
                }
                // Content is already saved; only the size hint in the name is stale.
                Err(e) => warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Cannot update size in maildir file name"
                ),
            }
        }
        Ok(())
    }

    fn save_as(&self, path: &Path) -> Result<(), StoreError> {
        fs::copy(&self.path, path)
            .map(|_| ())
            .map_err(|e| StoreError::ExportFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

/// Map the root `Content-Type` to an item classification.
fn classify(content_type: Option<&ContentType>) -> &'static str {
    let Some(ct) = content_type else {
        return MAIL_CLASS_PREFIX;
    };
    let param = |key: &str| ct.attribute(key).map(str::to_ascii_lowercase);

    match (ct.ctype(), ct.subtype().unwrap_or_default()) {
        ("multipart", "report") => match param("report-type").as_deref() {
            Some("disposition-notification") => "REPORT.IPM.Note.IPNRN",
            Some("delivery-status") => "REPORT.IPM.Note.NDR",
            _ => "REPORT.IPM.Note",
        },
        ("text", "calendar") => match param("method").as_deref() {
            Some("cancel") => "IPM.Schedule.Meeting.Canceled",
            Some("reply") => "IPM.Schedule.Meeting.Resp",
            _ => "IPM.Schedule.Meeting.Request",
        },
        _ => MAIL_CLASS_PREFIX,
    }
}

fn is_maildir(path: &Path) -> bool {
    path.is_dir()
        && path.join("cur").is_dir()
        && path.join("new").is_dir()
        && path.join("tmp").is_dir()
}
