//! Export index file format.
//!
//! UTF-8 JSON, one object keyed by identity key:
//!
//! ```text
//! {
//!   "imid:<abc@example.com>": {
//!     "ExportedAt": "2026-10-19T07:30:00.123456Z",
//!     "FilePath": "/archive/2026-10-18/2026-10-18 - Ann - Report.msg",
//!     "Hash": null
//!   },
//!   "eid:00000000A1B2": { ... }
//! }
//! ```

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default file name of the index inside the export root.
pub const DEFAULT_INDEX_FILE: &str = "export-index.json";

/// Proof that one identity was written to the archive.
///
/// Created once per identity and never rewritten by later runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    #[serde(rename = "ExportedAt")]
    pub exported_at: DateTime<Utc>,
    #[serde(rename = "FilePath")]
    pub file_path: PathBuf,
    /// Hex SHA-256 of the written file, when hashing is enabled.
    #[serde(rename = "Hash")]
    pub content_hash: Option<String>,
}

impl ExportRecord {
    pub fn new(file_path: PathBuf, content_hash: Option<String>) -> Self {
        Self {
            exported_at: Utc::now(),
            file_path,
            content_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_json_shape() {
        let record = ExportRecord {
            exported_at: Utc.with_ymd_and_hms(2026, 10, 19, 7, 30, 0).unwrap(),
            file_path: PathBuf::from("/archive/a.msg"),
            content_hash: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ExportedAt": "2026-10-19T07:30:00Z",
                "FilePath": "/archive/a.msg",
                "Hash": null,
            })
        );
    }

    #[test]
    fn test_record_accepts_offset_timestamps() {
        let json = r#"{"ExportedAt":"2026-10-19T09:30:00+02:00","FilePath":"x.msg","Hash":"ab"}"#;
        let record: ExportRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.exported_at,
            Utc.with_ymd_and_hms(2026, 10, 19, 7, 30, 0).unwrap()
        );
        assert_eq!(record.content_hash.as_deref(), Some("ab"));
    }
}
