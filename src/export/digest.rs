//! Content digests of exported files.

use std::fs::File;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Result, SweepError};

/// Hex-encoded SHA-256 of the whole file at `path`.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| SweepError::io(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| SweepError::io(path, e))?;
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.msg");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(sha256_file(&dir.path().join("missing")).is_err());
    }
}
