//! BLAKE3 compression function.
//!
//! The only place the mixing permutation runs. Everything above this
//! layer (chunks, parent nodes, the root) is a different choice of
//! chaining value, block, counter and [`Flags`].

use crate::{BLOCK_LEN, OUT_LEN};

/// Chaining value as eight little-endian words.
pub type CvWords = [u32; 8];

/// Chaining value as bytes (little-endian encoding of [`CvWords`]).
pub type CvBytes = [u8; OUT_LEN];

/// BLAKE3 initialization vector (same constants as SHA-256).
pub const IV: CvWords = [
    0x6A09_E667,
    0xBB67_AE85,
    0x3C6E_F372,
    0xA54F_F53A,
    0x510E_527F,
    0x9B05_688C,
    0x1F83_D9AB,
    0x5BE0_CD19,
];

/// Message word order for each of the seven rounds.
const MSG_SCHEDULE: [[usize; 16]; 7] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [2, 6, 3, 10, 7, 0, 4, 13, 1, 11, 12, 5, 9, 14, 15, 8],
    [3, 4, 10, 12, 13, 2, 7, 14, 6, 5, 9, 0, 11, 15, 8, 1],
    [10, 7, 12, 9, 14, 3, 13, 15, 4, 0, 11, 2, 5, 8, 1, 6],
    [12, 13, 9, 11, 15, 10, 14, 8, 7, 2, 5, 3, 0, 1, 6, 4],
    [9, 14, 11, 5, 8, 12, 15, 1, 13, 3, 0, 10, 2, 6, 4, 7],
    [11, 15, 5, 0, 1, 9, 8, 6, 14, 10, 2, 12, 3, 4, 7, 13],
];

bitflags::bitflags! {
    /// Domain-separation bits attached to every compression call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u8 {
        /// First block of a chunk
        const CHUNK_START = 1 << 0;
        /// Last block of a chunk
        const CHUNK_END = 1 << 1;
        /// Parent node of the hash tree
        const PARENT = 1 << 2;
        /// Root node (final output)
        const ROOT = 1 << 3;
    }
}

#[inline(always)]
fn g(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize, x: u32, y: u32) {
    state[a] = state[a].wrapping_add(state[b]).wrapping_add(x);
    state[d] = (state[d] ^ state[a]).rotate_right(16);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_right(12);
    state[a] = state[a].wrapping_add(state[b]).wrapping_add(y);
    state[d] = (state[d] ^ state[a]).rotate_right(8);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_right(7);
}

#[inline(always)]
fn round(state: &mut [u32; 16], msg: &[u32; 16], schedule: &[usize; 16]) {
    // Columns
    g(state, 0, 4, 8, 12, msg[schedule[0]], msg[schedule[1]]);
    g(state, 1, 5, 9, 13, msg[schedule[2]], msg[schedule[3]]);
    g(state, 2, 6, 10, 14, msg[schedule[4]], msg[schedule[5]]);
    g(state, 3, 7, 11, 15, msg[schedule[6]], msg[schedule[7]]);

    // Diagonals
    g(state, 0, 5, 10, 15, msg[schedule[8]], msg[schedule[9]]);
    g(state, 1, 6, 11, 12, msg[schedule[10]], msg[schedule[11]]);
    g(state, 2, 7, 8, 13, msg[schedule[12]], msg[schedule[13]]);
    g(state, 3, 4, 9, 14, msg[schedule[14]], msg[schedule[15]]);
}

fn permute_state(
    cv: &CvWords,
    block: &[u8; BLOCK_LEN],
    block_len: u8,
    counter: u64,
    flags: Flags,
) -> [u32; 16] {
    debug_assert!(block_len as usize <= BLOCK_LEN);
    let msg = words_from_le_bytes_64(block);

    let mut state = [
        cv[0],
        cv[1],
        cv[2],
        cv[3],
        cv[4],
        cv[5],
        cv[6],
        cv[7],
        IV[0],
        IV[1],
        IV[2],
        IV[3],
        counter as u32,
        (counter >> 32) as u32,
        u32::from(block_len),
        u32::from(flags.bits()),
    ];

    for schedule in &MSG_SCHEDULE {
        round(&mut state, &msg, schedule);
    }

    state
}

/// Compress one block into a new chaining value.
///
/// `block` must be zero-padded past `block_len`.
#[must_use]
pub fn compress(
    cv: &CvWords,
    block: &[u8; BLOCK_LEN],
    block_len: u8,
    counter: u64,
    flags: Flags,
) -> CvWords {
    let state = permute_state(cv, block, block_len, counter, flags);
    let mut out = [0u32; 8];
    for (i, word) in out.iter_mut().enumerate() {
        *word = state[i] ^ state[i + 8];
    }
    out
}

/// Widened compression producing a full 64-byte output block.
///
/// Used for root output. `counter` selects which 64-byte window of the
/// output stream is produced.
#[must_use]
pub fn compress_wide(
    cv: &CvWords,
    block: &[u8; BLOCK_LEN],
    block_len: u8,
    counter: u64,
    flags: Flags,
) -> [u8; 2 * OUT_LEN] {
    let mut state = permute_state(cv, block, block_len, counter, flags);
    for i in 0..8 {
        state[i] ^= state[i + 8];
        state[i + 8] ^= cv[i];
    }

    let mut out = [0u8; 2 * OUT_LEN];
    for (bytes, word) in out.chunks_exact_mut(4).zip(state.iter()) {
        bytes.copy_from_slice(&word.to_le_bytes());
    }
    out
}

/// Decode a 64-byte block into sixteen little-endian words.
#[must_use]
pub fn words_from_le_bytes_64(bytes: &[u8; BLOCK_LEN]) -> [u32; 16] {
    let mut words = [0u32; 16];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

/// Decode a 32-byte chaining value into words.
#[must_use]
pub fn words_from_le_bytes_32(bytes: &CvBytes) -> CvWords {
    let mut words = [0u32; 8];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

/// Encode a chaining value as 32 little-endian bytes.
#[must_use]
pub fn le_bytes_from_words_32(words: &CvWords) -> CvBytes {
    let mut bytes = [0u8; OUT_LEN];
    for (chunk, word) in bytes.chunks_exact_mut(4).zip(words.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    bytes
}
