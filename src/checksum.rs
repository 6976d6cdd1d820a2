//! 64-bit XOR checksum shared by the superblock and log block formats.
//!
//! Treats `buf` as little-endian `u64` words, skips the first word (the
//! checksum field itself), XORs the rest, and adds a constant so the
//! all-zero block doesn't check out as valid.

const CHECKSUM_BIAS: u64 = 3;

/// `buf.len()` must be a multiple of 8; the first 8 bytes are the
/// checksum field and are excluded from the XOR.
pub fn checksum(buf: &[u8]) -> u64 {
    debug_assert!(buf.len() >= 8, "buffer must hold at least the checksum field");
    debug_assert!(buf.len() % 8 == 0, "buffer must be a whole number of 8-byte words");

    let mut sum: u64 = 0;
    for word in buf[8..].chunks_exact(8) {
        sum ^= u64::from_le_bytes(word.try_into().expect("chunk is exactly 8 bytes"));
    }
    sum + CHECKSUM_BIAS
}
