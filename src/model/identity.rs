//! Stable identity keys used to deduplicate exports across runs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::MailItem;

/// Prefix for keys derived from the `Message-ID` of an item.
pub const MESSAGE_ID_PREFIX: &str = "imid:";

/// Prefix for keys derived from the store-local entry id.
pub const ENTRY_ID_PREFIX: &str = "eid:";

/// The key an export record is filed under.
///
/// A message identifier survives moves and copies between folders, so the
/// same logical message filed twice maps to one key. Entry ids are only
/// meaningful inside one store and are used when no message id exists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Derive the key from the identity candidates of an item.
    ///
    /// - `Some("<Abc@Example.com> ")` → `imid:<abc@example.com>`
    /// - `None` / blank message id → `eid:{entry_id}` (entry id kept verbatim)
    pub fn derive(message_id: Option<&str>, entry_id: &str) -> Self {
        match message_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => Self(format!("{MESSAGE_ID_PREFIX}{}", id.to_lowercase())),
            None => Self(format!("{ENTRY_ID_PREFIX}{entry_id}")),
        }
    }

    /// Derive the key for a live mail item.
    pub fn of(item: &dyn MailItem) -> Self {
        Self::derive(item.message_id(), item.entry_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_is_trimmed_and_lowercased() {
        let key = IdentityKey::derive(Some("  <ABC.123@Example.COM>\t"), "entry-1");
        assert_eq!(key.as_str(), "imid:<abc.123@example.com>");
    }

    #[test]
    fn test_blank_message_id_falls_back_to_entry_id() {
        assert_eq!(
            IdentityKey::derive(Some("   "), "00000000ABCDEF").as_str(),
            "eid:00000000ABCDEF"
        );
        assert_eq!(
            IdentityKey::derive(None, "00000000ABCDEF").as_str(),
            "eid:00000000ABCDEF"
        );
    }

    #[test]
    fn test_entry_id_case_is_preserved() {
        let key = IdentityKey::derive(None, "AbCd");
        assert_eq!(key.to_string(), "eid:AbCd");
    }

    #[test]
    fn test_same_message_id_same_key() {
        let a = IdentityKey::derive(Some("<x@y>"), "entry-inbox");
        let b = IdentityKey::derive(Some("<X@Y>"), "entry-archive");
        assert_eq!(a, b);
    }
}
