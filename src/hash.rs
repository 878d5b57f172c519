//! SHA-1 footprinting.
//!
//! SHA-1 is retained here purely for compatibility with the on-disk
//! footprint format (see [`crate::footprint`]) — this is a content hash,
//! not a security primitive, and nothing here is used for verifying
//! trust.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use sha1::{Digest, Sha1};

/// Hash a byte slice.
pub fn sha1_bytes(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash a string.
pub fn sha1_str(s: &str) -> String {
    sha1_bytes(s.as_bytes())
}

/// Hash a file's contents, streaming so large sources don't need to be
/// loaded whole.
pub fn sha1_file(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha1::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Incrementally build a fingerprint out of several components, in the
/// same spirit as concatenating and re-hashing but without materializing
/// the concatenation.
#[derive(Default)]
pub struct Fingerprint {
    hasher: Sha1,
}

impl Fingerprint {
    pub fn new() -> Self {
        Fingerprint {
            hasher: Sha1::new(),
        }
    }

    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.hasher.update(s.as_bytes());
        self.hasher.update(b"\0");
        self
    }

    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sha1_str_known_vector() {
        assert_eq!(sha1_str(""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn sha1_file_matches_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.c");
        std::fs::write(&path, "int main(void) { return 0; }").unwrap();
        assert_eq!(
            sha1_file(&path).unwrap(),
            sha1_bytes(b"int main(void) { return 0; }")
        );
    }

    #[test]
    fn fingerprint_is_sensitive_to_components() {
        let mut a = Fingerprint::new();
        a.update_str("x").update_str("y");
        let mut b = Fingerprint::new();
        b.update_str("x").update_str("z");
        assert_ne!(a.finish(), b.finish());
    }
}
