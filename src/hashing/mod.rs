//! BLAKE3 hashing for storage keys and log fields.

/// Full 256-bit BLAKE3 hash of `key`.
#[inline]
pub fn hash_key(key: &str) -> [u8; 32] {
    *blake3::hash(key.as_bytes()).as_bytes()
}

/// Lower-case hex of the BLAKE3 hash of `key` (64 characters).
///
/// Used as the on-disk file name for a key, so arbitrary key text never
/// reaches the filesystem.
#[inline]
pub fn hash_key_hex(key: &str) -> String {
    blake3::hash(key.as_bytes()).to_hex().to_string()
}

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// Good enough for log correlation and sharding; use [`hash_key`] where a
/// collision would matter.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
