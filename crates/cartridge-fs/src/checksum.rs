//! SHA-256 checksum utilities
//!
//! Checksums are rendered in the canonical format `sha256:<hex>`. Expected
//! values supplied by manifests may omit the prefix and use any hex case.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::{Error, Result};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

const BUF_SIZE: usize = 64 * 1024;

/// Compute the SHA-256 checksum of in-memory content.
pub fn compute_bytes_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the SHA-256 checksum of a file without loading it whole.
pub fn compute_file_checksum(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let read = reader.read(&mut buf).map_err(|e| Error::io(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{}{:x}", PREFIX, hasher.finalize()))
}

/// Bring a checksum into canonical form: trimmed, lowercase, `sha256:` prefixed.
pub fn normalize(checksum: &str) -> String {
    let trimmed = checksum.trim().to_ascii_lowercase();
    match trimmed.strip_prefix(PREFIX) {
        Some(hex) => format!("{PREFIX}{hex}"),
        None => format!("{PREFIX}{trimmed}"),
    }
}

/// Compare an expected checksum against a computed one after normalization.
pub fn matches(expected: &str, actual: &str) -> bool {
    normalize(expected) == normalize(actual)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_checksum_known_value() {
        let checksum = compute_bytes_checksum(b"hello world");
        assert_eq!(
            checksum,
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn file_checksum_matches_bytes_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        std::fs::write(&path, "hello world").unwrap();

        let file_cs = compute_file_checksum(&path).unwrap();
        assert_eq!(file_cs, compute_bytes_checksum(b"hello world"));
    }

    #[test]
    fn file_checksum_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.bin");

        let err = compute_file_checksum(&path).unwrap_err();
        assert!(err.to_string().contains("absent.bin"));
    }

    #[test]
    fn bare_and_uppercase_hex_match_canonical() {
        let canonical = compute_bytes_checksum(b"hello world");
        let bare = "B94D27B9934D3E08A52E52D7DA7DABFAC484EFE37A5380EE9088F7ACE2EFCDE9";
        assert!(matches(bare, &canonical));
        assert!(matches(&format!("  {canonical} "), &canonical));
    }

    #[test]
    fn different_content_does_not_match() {
        let a = compute_bytes_checksum(b"aaa");
        let b = compute_bytes_checksum(b"bbb");
        assert!(!matches(&a, &b));
    }
}
