//! SHA-256 checksum utility used as the identity of update script content.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 checksum of raw script bytes as lowercase hex.
///
/// No line-ending normalization is applied: a file saved with CRLF endings
/// hashes differently from the same file saved with LF endings.
pub fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!("{:x}", result)
}
