//! SHA-256 checksum utilities
//!
//! Every rule carries a checksum in the canonical `sha256:<hex>` format. The
//! same format is used for the remote snapshot, the recorded sync state and
//! historical snapshots, so hashes are comparable across all three.

use sha2::{Digest, Sha256};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of raw bytes.
pub fn compute_bytes_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the SHA-256 checksum of string content.
pub fn compute_content_checksum(content: &str) -> String {
    compute_bytes_checksum(content.as_bytes())
}
