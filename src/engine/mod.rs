//! The incremental export engine.
//!
//! A run loads the export index, builds the item query, lets the traversal
//! export everything matching that is not indexed yet, and saves the index
//! once at the end. Everything between load and save is strictly
//! sequential; at most one run may target an export root at a time.

pub mod filter;
pub mod locator;
pub mod processor;
pub mod traversal;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::ArchiveConfig;
use crate::error::{Result, SweepError};
use crate::index::ExportIndex;
use crate::store::MailStore;

/// Per-run parameters the processor needs for every item.
#[derive(Debug, Clone)]
pub struct SweepSettings {
    pub export_root: PathBuf,
    pub archive_tag: String,
    /// `None` disables re-tagging.
    pub post_export_tag: Option<String>,
    pub compute_content_hash: bool,
    /// Extension of exported files, without the dot.
    pub extension: String,
}

impl SweepSettings {
    pub fn new(config: &ArchiveConfig, extension: &str) -> Self {
        let post_export_tag = Some(config.post_export_tag.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        Self {
            export_root: config.export_root.clone(),
            archive_tag: config.archive_tag.trim().to_string(),
            post_export_tag,
            compute_content_hash: config.compute_content_hash,
            extension: extension.to_string(),
        }
    }
}

/// Totals of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    /// Items written and indexed by this run.
    pub exported: usize,
    /// Records in the index after the run.
    pub indexed: usize,
}

/// Make sure the export root exists and accepts new files.
pub fn prepare_export_root(root: &Path) -> Result<()> {
    let unwritable = |source: std::io::Error| SweepError::ExportRootUnwritable {
        path: root.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(root).map_err(unwritable)?;
    tempfile::tempfile_in(root).map_err(unwritable)?;
    Ok(())
}

/// Run one export pass over `store` and persist the index.
pub fn sweep(store: &mut dyn MailStore, config: &ArchiveConfig) -> Result<SweepSummary> {
    let settings = SweepSettings::new(config, store.export_extension());
    let mut index = ExportIndex::load(config.index_path());
    let query = filter::build(&settings.archive_tag, config.min_age_days);
    info!(
        query = %query,
        folders = config.folders_to_scan.len(),
        known = index.len(),
        "Starting export run"
    );

    let exported = traversal::run(store, &config.folders_to_scan, &query, &mut index, &settings);
    index.save()?;

    Ok(SweepSummary {
        exported,
        indexed: index.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_post_export_tag_disables_retag() {
        let config = ArchiveConfig {
            post_export_tag: "   ".into(),
            ..ArchiveConfig::default()
        };
        assert!(SweepSettings::new(&config, "msg").post_export_tag.is_none());
    }

    #[test]
    fn test_prepare_export_root_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("a").join("b");
        prepare_export_root(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn test_prepare_export_root_under_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, b"").unwrap();
        assert!(matches!(
            prepare_export_root(&file.join("root")),
            Err(SweepError::ExportRootUnwritable { .. })
        ));
    }
}
