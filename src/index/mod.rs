//! The export index: which identities have already been archived.
//!
//! The index is loaded once at the start of a run, held in memory while
//! folders are processed, and saved once at the end by atomically replacing
//! the previous file. If a run dies before the save, files it wrote stay on
//! disk unindexed and the next run exports those items again under a fresh,
//! non-colliding name.

pub mod format;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, SweepError};
use crate::model::identity::IdentityKey;

pub use format::{ExportRecord, DEFAULT_INDEX_FILE};

/// In-memory export index bound to its file.
#[derive(Debug, Clone)]
pub struct ExportIndex {
    path: PathBuf,
    records: BTreeMap<IdentityKey, ExportRecord>,
}

impl ExportIndex {
    /// An empty index that will be saved to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: BTreeMap::new(),
        }
    }

    /// Load the index at `path`.
    ///
    /// Never fails: a missing file gives an empty index, and an unreadable
    /// or unparseable one is logged and also gives an empty index. Files
    /// already in the archive are left alone either way.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No export index yet, starting empty");
                return Self::empty(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read export index, starting empty");
                return Self::empty(path);
            }
        };

        match serde_json::from_str::<BTreeMap<IdentityKey, ExportRecord>>(&contents) {
            Ok(records) => {
                debug!(path = %path.display(), count = records.len(), "Loaded export index");
                Self { path, records }
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Export index is corrupt, starting empty; previously archived items may be exported again"
                );
                Self::empty(path)
            }
        }
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&ExportRecord> {
        self.records.get(key)
    }

    /// Insert a record for `key`.
    ///
    /// Records are immutable: if `key` is already present the existing
    /// record is kept, a warning is logged and `false` is returned. Callers
    /// are expected to check [`ExportIndex::contains`] first.
    pub fn record(&mut self, key: IdentityKey, record: ExportRecord) -> bool {
        if let Some(existing) = self.records.get(&key) {
            warn!(
                identity = %key,
                existing = %existing.file_path.display(),
                rejected = %record.file_path.display(),
                "Refusing to overwrite export record"
            );
            return false;
        }
        self.records.insert(key, record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IdentityKey, &ExportRecord)> {
        self.records.iter()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole index, replacing the previous file atomically.
    ///
    /// The JSON goes to a temporary file in the same directory, which is
    /// synced and then renamed over the index, so a crash never leaves a
    /// half-written index behind.
    pub fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| SweepError::io(&dir, e))?;

        let json = serde_json::to_string_pretty(&self.records).map_err(|e| {
            SweepError::InvalidIndex {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| SweepError::io(&dir, e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| SweepError::io(tmp.path(), e))?;
        tmp.persist(&self.path).map_err(|e| SweepError::InvalidIndex {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        info!(path = %self.path.display(), count = self.records.len(), "Export index saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str) -> IdentityKey {
        IdentityKey::derive(Some(id), "unused")
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = ExportIndex::load(dir.path().join("export-index.json"));
        assert!(index.is_empty());
    }

    #[test]
    fn test_load_corrupt_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export-index.json");
        std::fs::write(&path, "{ not json").unwrap();
        let index = ExportIndex::load(&path);
        assert!(index.is_empty());
        // The corrupt file is left in place until the next save.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_load_corrupt_or_blank_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export-index.json");
        for contents in ["[1, 2", "  \n"] {
            std::fs::write(&path, contents).unwrap();
            let (index, logs) = crate::logging::capture(|| ExportIndex::load(&path));
            assert!(index.is_empty());
            assert!(
                logs.lines()
                    .any(|l| l.contains("WARN: Export index is corrupt, starting empty")),
                "no warning for {contents:?} in {logs}"
            );
        }
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export-index.json");
        let mut index = ExportIndex::load(&path);
        assert!(index.record(
            key("<a@x>"),
            ExportRecord::new(dir.path().join("a.msg"), Some("ff".into()))
        ));
        assert!(index.record(key("<b@x>"), ExportRecord::new(dir.path().join("b.msg"), None)));
        index.save().unwrap();

        let reloaded = ExportIndex::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get(&key("<a@x>")), index.get(&key("<a@x>")));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["imid:<b@x>"]["Hash"].is_null());
        assert_eq!(raw["imid:<a@x>"]["Hash"], "ff");
    }

    #[test]
    fn test_save_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export-index.json");
        std::fs::write(&path, "garbage").unwrap();
        let mut index = ExportIndex::load(&path);
        index.record(key("<a@x>"), ExportRecord::new("a.msg".into(), None));
        index.save().unwrap();
        assert_eq!(ExportIndex::load(&path).len(), 1);
        // No temporary files left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_double_record_keeps_first() {
        let mut index = ExportIndex::empty("unused.json");
        let first = ExportRecord::new("first.msg".into(), None);
        assert!(index.record(key("<a@x>"), first.clone()));
        assert!(!index.record(key("<a@x>"), ExportRecord::new("second.msg".into(), None)));
        assert_eq!(index.get(&key("<a@x>")), Some(&first));
        assert_eq!(index.len(), 1);
    }
}
