//! Content digests for rendered documents
//!
//! Provides [`DocumentDigest`], a 32-byte Blake3 hash of a document's
//! canonical YAML. Two renders of the same request always share a digest.

use std::fmt::{self, Display, Formatter};

/// A 32-byte document digest (Blake3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentDigest([u8; 32]);

impl DocumentDigest {
    /// Compute Blake3 digest of arbitrary data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for DocumentDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        let a = DocumentDigest::compute(b"cors:\n  origins: []\n");
        let b = DocumentDigest::compute(b"cors:\n  origins: []\n");
        assert_eq!(a, b);
        assert_ne!(a, DocumentDigest::compute(b"cors: {}\n"));
    }

    #[test]
    fn digest_short_is_display_prefix() {
        let digest = DocumentDigest::compute(b"limits: {}");
        let full = digest.to_string();
        assert_eq!(full.len(), 64);
        assert_eq!(digest.short().len(), 16);
        assert!(full.starts_with(&digest.short()));
    }
}
