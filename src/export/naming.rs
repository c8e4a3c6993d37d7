//! Destination paths for exported items.
//!
//! `{root}/{YYYY-MM-DD}/{YYYY-MM-DD} - {sender} - {subject}.{ext}`, with
//! ` (1)`, ` (2)`, … inserted before the extension when the name is taken.

use std::path::{Path, PathBuf};

use crate::error::{Result, SweepError};

/// Hard cap on the composed base name, in characters.
pub const MAX_BASE_NAME_CHARS: usize = 160;

/// Placeholder for a subject that sanitizes to nothing.
pub const EMPTY_SUBJECT: &str = "(no-subject)";

/// Placeholder for any other field that sanitizes to nothing.
pub const EMPTY_FIELD: &str = "(empty)";

/// Characters that may not appear in a path component on common filesystems.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Resolve a free archive path for an item and create its date directory.
///
/// `date` is the item's received date, already formatted as `YYYY-MM-DD`.
pub fn resolve(
    root: &Path,
    date: &str,
    sender: &str,
    subject: &str,
    extension: &str,
) -> Result<PathBuf> {
    let dir = root.join(date);
    std::fs::create_dir_all(&dir).map_err(|e| SweepError::io(&dir, e))?;

    let base = base_name(date, sender, subject);
    Ok(unique_path(&dir, &base, extension))
}

/// Compose `"{date} - {sender} - {subject}"` and cap it.
pub fn base_name(date: &str, sender: &str, subject: &str) -> String {
    let sender = sanitize_component(sender, EMPTY_FIELD);
    let subject = sanitize_component(subject, EMPTY_SUBJECT);
    let name: String = format!("{date} - {sender} - {subject}")
        .chars()
        .take(MAX_BASE_NAME_CHARS)
        .collect();
    // A trailing dot or space is not a valid name ending on Windows.
    name.trim_end_matches(['.', ' ']).to_string()
}

/// Replace invalid characters with `-` and trim; blank becomes `placeholder`.
pub fn sanitize_component(s: &str, placeholder: &str) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if INVALID_CHARS.contains(&c) || c.is_control() {
                '-'
            } else {
                c
            }
        })
        .collect();
    let trimmed = sanitized.trim();
    if trimmed.is_empty() {
        placeholder.to_string()
    } else {
        trimmed.to_string()
    }
}

/// First of `base.ext`, `base (1).ext`, `base (2).ext`, … that does not exist.
fn unique_path(dir: &Path, base: &str, extension: &str) -> PathBuf {
    let candidate = dir.join(format!("{base}.{extension}"));
    if !candidate.exists() {
        return candidate;
    }
    (1u64..)
        .map(|n| dir.join(format!("{base} ({n}).{extension}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
