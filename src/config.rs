//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. the path given with `--config`
//! 2. `$MAILSWEEP_CONFIG` (environment variable)
//! 3. `~/.config/mailsweep/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailsweep\config.toml` (Windows)
//! 4. Built-in defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SweepError};
use crate::index::DEFAULT_INDEX_FILE;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub general: GeneralConfig,
    /// What to export, where to, and how to mark it afterwards.
    pub archive: ArchiveConfig,
    /// Which mail store to read.
    pub store: StoreConfig,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override directory for the log file.
    pub log_dir: Option<PathBuf>,
}

/// Export options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Tag marking an item for export.
    pub archive_tag: String,
    /// Tag an item is moved to after export. Empty disables re-tagging.
    pub post_export_tag: String,
    /// Only export items at least this many days old. 0 disables.
    pub min_age_days: i64,
    /// Absolute directory the archive is written to.
    pub export_root: PathBuf,
    /// Folder paths to scan, e.g. `"Inbox/Projects"`. Empty scans the whole store.
    pub folders_to_scan: Vec<String>,
    /// Record a SHA-256 of every exported file.
    pub compute_content_hash: bool,
    /// Override location of the export index.
    pub index_file: Option<PathBuf>,
}

/// Mail store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root of a Maildir++ store.
    pub maildir: PathBuf,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            archive_tag: "Archive".to_string(),
            post_export_tag: "Archived".to_string(),
            min_age_days: 0,
            export_root: home_dir().join("MailArchive"),
            folders_to_scan: Vec::new(),
            compute_content_hash: false,
            index_file: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            maildir: home_dir().join("Maildir"),
        }
    }
}

impl ArchiveConfig {
    /// Where the export index lives.
    pub fn index_path(&self) -> PathBuf {
        self.index_file
            .clone()
            .unwrap_or_else(|| self.export_root.join(DEFAULT_INDEX_FILE))
    }
}

impl Config {
    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let archive = &self.archive;
        if archive.archive_tag.trim().is_empty() {
            return Err(SweepError::InvalidConfig(
                "archive.archive_tag must not be empty".to_string(),
            ));
        }
        if archive.min_age_days < 0 {
            return Err(SweepError::InvalidConfig(format!(
                "archive.min_age_days must be >= 0, got {}",
                archive.min_age_days
            )));
        }
        if !archive.export_root.is_absolute() {
            return Err(SweepError::InvalidConfig(format!(
                "archive.export_root must be an absolute path, got '{}'",
                archive.export_root.display()
            )));
        }
        Ok(())
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration from `explicit`, or from the standard locations.
///
/// A missing file in a standard location gives the defaults. A file that
/// exists but cannot be read or parsed is an error: running an archiver
/// with settings the user did not intend is worse than not running.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => config_file_path().filter(|p| p.exists()),
    };
    let Some(path) = path else {
        tracing::debug!("No config file, using defaults");
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| SweepError::io(&path, e))?;
    let config = parse_config(&contents).map_err(|e| {
        SweepError::InvalidConfig(format!("{}: {e}", path.display()))
    })?;
    tracing::info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse TOML configuration text.
pub fn parse_config(contents: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(contents)
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILSWEEP_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mailsweep").join("config.toml"))
}

/// Return the directory the log file is written to.
pub fn log_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.log_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailsweep")
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}
