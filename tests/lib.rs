//! Shared helpers for the rasmx integration tests.

use rasmx_blake3::Hasher;

/// Deterministic test input: byte `i` is `i % 251`.
#[must_use]
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Hex digest from the `blake3` reference crate.
#[must_use]
pub fn reference_hex(input: &[u8]) -> String {
    hex::encode(blake3::hash(input).as_bytes())
}

/// Feed `input` to a fresh hasher, split at the given (sorted) offsets.
///
/// Offsets past the end of the input are clamped.
///
/// # Panics
///
/// Panics if the hasher rejects an update, which a fresh hasher never does.
#[must_use]
pub fn hash_split(input: &[u8], offsets: &[usize]) -> rasmx_blake3::Digest {
    let mut hasher = Hasher::new();
    let mut start = 0;
    for &offset in offsets {
        let end = offset.clamp(start, input.len());
        hasher.update(&input[start..end]).expect("open hasher");
        start = end;
    }
    hasher.update(&input[start..]).expect("open hasher");
    hasher.finalize().expect("open hasher")
}
