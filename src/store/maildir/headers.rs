//! In-place header rewriting for Maildir messages.
//!
//! Reading is left to `mail-parser`; this only replaces one header without
//! touching the rest of the message bytes.

/// Byte offset where the header block ends (start of the blank line).
fn find_header_end(data: &[u8]) -> Option<usize> {
    for i in 0..data.len().saturating_sub(1) {
        if data[i] == b'\n' && data[i + 1] == b'\n' {
            return Some(i + 1);
        }
        if data[i] == b'\n' && data[i + 1] == b'\r' && data.get(i + 2) == Some(&b'\n') {
            return Some(i + 1);
        }
    }
    None
}

/// Return a copy of `data` with header `name` set to `value`.
///
/// Every existing occurrence (including folded continuation lines) is
/// removed and a single new line is appended at the end of the header
/// block, using the message's own line ending.
pub fn set_header(data: &[u8], name: &str, value: &str) -> Vec<u8> {
    let end = find_header_end(data).unwrap_or(data.len());
    let (head, body) = data.split_at(end);
    let eol: &[u8] = if head.windows(2).any(|w| w == b"\r\n") {
        b"\r\n"
    } else {
        b"\n"
    };

    let mut out = Vec::with_capacity(data.len() + name.len() + value.len() + 4);
    let mut skipping = false;
    for line in head.split_inclusive(|&b| b == b'\n') {
        if skipping && line.first().is_some_and(|b| *b == b' ' || *b == b'\t') {
            continue;
        }
        skipping = is_header_line(line, name);
        if !skipping {
            out.extend_from_slice(line);
        }
    }
    if !out.is_empty() && !out.ends_with(b"\n") {
        out.extend_from_slice(eol);
    }
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(value.as_bytes());
    out.extend_from_slice(eol);
    if body.is_empty() {
        out.extend_from_slice(eol);
    }
    out.extend_from_slice(body);
    out
}

fn is_header_line(line: &[u8], name: &str) -> bool {
    line.len() > name.len()
        && line[name.len()] == b':'
        && line[..name.len()].eq_ignore_ascii_case(name.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MSG: &[u8] = b"From: a@b.com\nX-Keywords: Red,\n Archive\nSubject: Hi\n\nBody\n";

    #[test]
    fn test_find_header_end() {
        assert_eq!(find_header_end(b"A: 1\n\nBody"), Some(5));
        assert_eq!(find_header_end(b"A: 1\r\n\r\nBody"), Some(6));
        assert_eq!(find_header_end(b"A: 1\n"), None);
    }

    #[test]
    fn test_set_header_replaces_folded_value() {
        let out = set_header(MSG, "X-Keywords", "Red, Archived");
        assert_eq!(
            out,
            b"From: a@b.com\nSubject: Hi\nX-Keywords: Red, Archived\n\nBody\n".to_vec()
        );
    }

    #[test]
    fn test_set_header_adds_missing_header_crlf() {
        let out = set_header(b"Subject: Hi\r\n\r\nBody", "X-Keywords", "Archived");
        assert_eq!(out, b"Subject: Hi\r\nX-Keywords: Archived\r\n\r\nBody".to_vec());
    }
}
