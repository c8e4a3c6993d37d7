//! Centralized error types for mailsweep.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can end a sweep run.
///
/// Per-item and per-folder failures never surface here; the engine logs
/// them and moves on. Only conditions that make the whole run pointless
/// (or would lose the durable record of what was exported) are reported.
#[derive(Error, Debug)]
pub enum SweepError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The export root could not be created or is not writable.
    #[error("Export root '{path}' is not writable: {source}")]
    ExportRootUnwritable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The export index could not be serialized or written.
    #[error("Cannot persist export index '{path}': {reason}")]
    InvalidIndex { path: PathBuf, reason: String },

    /// A mail store operation failed at a point where it cannot be skipped.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors reported by a mail store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The mail store (or the client hosting it) is not reachable.
    #[error("Mail store unavailable: {0}")]
    Unavailable(String),

    /// The folder rejected or failed to execute an item query.
    #[error("Query failed on folder '{folder}': {reason}")]
    QueryFailed { folder: String, reason: String },

    /// An item position no longer exists in a result view.
    #[error("No item at position {0}")]
    ItemNotFound(usize),

    /// Writing a message to the archive failed.
    #[error("Export to '{path}' failed: {reason}")]
    ExportFailed { path: PathBuf, reason: String },

    /// Persisting a mutated item failed.
    #[error("Saving item '{entry_id}' failed: {reason}")]
    SaveFailed { entry_id: String, reason: String },

    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias for `Result<T, SweepError>`.
pub type Result<T> = std::result::Result<T, SweepError>;

impl SweepError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl StoreError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
