//! Content hashing via xxh3.

use xxhash_rust::xxh3::xxh3_64;

/// Compute the xxh3 64-bit hash of file content.
#[inline]
pub fn hash_content(content: &[u8]) -> u64 {
    xxh3_64(content)
}

/// Hex rendering used in serialized output.
pub fn hash_hex(content: &[u8]) -> String {
    format!("{:016x}", hash_content(content))
}
