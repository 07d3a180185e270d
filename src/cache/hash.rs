//! Hashing utilities for cache keys.

use sha2::{Digest, Sha256};

/// Compute the SHA256 hash of a string.
///
/// Returns a 64-character lowercase hexadecimal string.
pub fn hash_str(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
