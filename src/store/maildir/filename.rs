//! Maildir filename parsing.
//!
//! Format: `<unique>[,<field>=<value>...][:2,<flags>]`, where `<unique>`
//! conventionally starts with the delivery time in seconds:
//! `1733356800.M12P345.host,S=4523:2,S`.

use chrono::{DateTime, Utc};

/// Delivery timestamps above this are taken to be milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// A parsed Maildir filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaildirFilename {
    /// Unique part, stable across flag and size changes.
    pub unique: String,
    /// `S=` size field, when present.
    pub size: Option<u64>,
    /// Other `,key=value` fields, kept verbatim.
    pub fields: Vec<String>,
    /// Everything after the `:` (e.g. `2,RS`).
    pub info: Option<String>,
}

impl MaildirFilename {
    pub fn parse(filename: &str) -> Option<Self> {
        let (base, info) = match filename.split_once(':') {
            Some((base, info)) => (base, Some(info.to_string())),
            None => (filename, None),
        };
        let mut parts = base.split(',');
        let unique = parts.next().filter(|u| !u.is_empty())?.to_string();

        let mut size = None;
        let mut fields = Vec::new();
        for part in parts {
            match part.strip_prefix("S=").map(str::parse::<u64>) {
                Some(Ok(s)) => size = Some(s),
                _ => fields.push(part.to_string()),
            }
        }

        Some(Self {
            unique,
            size,
            fields,
            info,
        })
    }

    /// Delivery time encoded in the leading digits of the unique part.
    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        let digits = self.unique.split('.').next()?;
        let value: i64 = digits.parse().ok()?;
        if value >= MILLIS_THRESHOLD {
            DateTime::from_timestamp_millis(value)
        } else {
            DateTime::from_timestamp(value, 0)
        }
    }

    /// Same name with the size field set to `size` (only if it had one).
    pub fn with_size(&self, size: u64) -> Self {
        Self {
            size: self.size.map(|_| size),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for MaildirFilename {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.unique)?;
        if let Some(size) = self.size {
            write!(f, ",S={size}")?;
        }
        for field in &self.fields {
            write!(f, ",{field}")?;
        }
        if let Some(info) = &self.info {
            write!(f, ":{info}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_name() {
        let name = MaildirFilename::parse("1733356800.M12P345.host,S=4523,W=4600:2,RS").unwrap();
        assert_eq!(name.unique, "1733356800.M12P345.host");
        assert_eq!(name.size, Some(4523));
        assert_eq!(name.fields, ["W=4600"]);
        assert_eq!(name.info.as_deref(), Some("2,RS"));
        assert_eq!(name.to_string(), "1733356800.M12P345.host,S=4523,W=4600:2,RS");
    }

    #[test]
    fn test_parse_bare_name() {
        let name = MaildirFilename::parse("1733356800.12345.host").unwrap();
        assert_eq!(name.size, None);
        assert_eq!(name.info, None);
        assert_eq!(name.with_size(10).to_string(), "1733356800.12345.host");
        assert!(MaildirFilename::parse(",S=1").is_none());
    }

    #[test]
    fn test_delivered_at_seconds_and_millis() {
        let secs = MaildirFilename::parse("1733356800.1.host").unwrap();
        let millis = MaildirFilename::parse("1733356800000.1.host").unwrap();
        assert_eq!(secs.delivered_at(), millis.delivered_at());
        assert_eq!(secs.delivered_at().unwrap().timestamp(), 1_733_356_800);
        assert!(MaildirFilename::parse("abc.host").unwrap().delivered_at().is_none());
    }

    #[test]
    fn test_with_size_updates_size() {
        let name = MaildirFilename::parse("1.2.h,S=10:2,").unwrap();
        assert_eq!(name.with_size(42).to_string(), "1.2.h,S=42:2,");
    }
}
