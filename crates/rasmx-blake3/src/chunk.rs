//! Chunk processing.
//!
//! A chunk is up to [`CHUNK_LEN`] bytes of input, folded block by block
//! through the compression function. The last block is held back until
//! the caller decides whether it is the root, so a chunk's state always
//! ends in an [`Output`].

use std::fmt;

use crate::compress::{self, CvWords, Flags, IV};
use crate::digest::Digest;
use crate::{BLOCK_LEN, CHUNK_LEN, OUT_LEN};

/// Inputs of a pending final compression.
///
/// Either [`Output::chaining_value`] (interior node) or
/// [`Output::root_digest`] (whole input) is taken from it; the two differ
/// only by the ROOT flag.
#[derive(Clone, Copy)]
pub struct Output {
    input_cv: CvWords,
    block: [u8; BLOCK_LEN],
    block_len: u8,
    counter: u64,
    flags: Flags,
}

impl Output {
    pub(crate) fn new(
        input_cv: CvWords,
        block: [u8; BLOCK_LEN],
        block_len: u8,
        counter: u64,
        flags: Flags,
    ) -> Self {
        Self {
            input_cv,
            block,
            block_len,
            counter,
            flags,
        }
    }

    /// Chaining value for use as a child of a parent node.
    #[must_use]
    pub fn chaining_value(&self) -> CvWords {
        compress::compress(
            &self.input_cv,
            &self.block,
            self.block_len,
            self.counter,
            self.flags,
        )
    }

    /// Final 32-byte digest, with ROOT set.
    #[must_use]
    pub fn root_digest(&self) -> Digest {
        // The root is always chunk 0 or a parent node, both at counter 0.
        debug_assert_eq!(self.counter, 0);
        let cv = compress::compress(
            &self.input_cv,
            &self.block,
            self.block_len,
            0,
            self.flags | Flags::ROOT,
        );
        Digest::from(compress::le_bytes_from_words_32(&cv))
    }

    /// One 64-byte window of the root output stream.
    ///
    /// Window `0` starts with the bytes of [`Output::root_digest`].
    #[must_use]
    pub fn root_output_block(&self, output_block_counter: u64) -> [u8; 2 * OUT_LEN] {
        compress::compress_wide(
            &self.input_cv,
            &self.block,
            self.block_len,
            output_block_counter,
            self.flags | Flags::ROOT,
        )
    }

    /// Flags the final compression will use (ROOT excluded).
    #[must_use]
    pub fn flags(&self) -> Flags {
        self.flags
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("block_len", &self.block_len)
            .field("counter", &self.counter)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// In-progress chunk.
#[derive(Clone)]
pub struct ChunkState {
    cv: CvWords,
    chunk_counter: u64,
    buf: [u8; BLOCK_LEN],
    buf_len: u8,
    blocks_compressed: u8,
}

impl ChunkState {
    /// Start chunk number `chunk_counter` (zero-based).
    #[must_use]
    pub fn new(chunk_counter: u64) -> Self {
        Self {
            cv: IV,
            chunk_counter,
            buf: [0; BLOCK_LEN],
            buf_len: 0,
            blocks_compressed: 0,
        }
    }

    /// Bytes absorbed so far (at most [`CHUNK_LEN`]).
    #[must_use]
    pub fn len(&self) -> usize {
        BLOCK_LEN * self.blocks_compressed as usize + self.buf_len as usize
    }

    /// True if no bytes have been absorbed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of this chunk within the whole input.
    #[must_use]
    pub fn chunk_counter(&self) -> u64 {
        self.chunk_counter
    }

    fn start_flag(&self) -> Flags {
        if self.blocks_compressed == 0 {
            Flags::CHUNK_START
        } else {
            Flags::empty()
        }
    }

    fn fill_buf(&mut self, input: &mut &[u8]) {
        let want = BLOCK_LEN - self.buf_len as usize;
        let take = want.min(input.len());
        self.buf[self.buf_len as usize..][..take].copy_from_slice(&input[..take]);
        self.buf_len += take as u8;
        *input = &input[take..];
    }

    fn compress_buffer(&mut self) {
        self.cv = compress::compress(
            &self.cv,
            &self.buf,
            BLOCK_LEN as u8,
            self.chunk_counter,
            self.start_flag(),
        );
        self.blocks_compressed += 1;
        self.buf = [0; BLOCK_LEN];
        self.buf_len = 0;
    }

    /// Absorb input.
    ///
    /// A full block is only compressed once more input follows it, so the
    /// final block is always available to [`ChunkState::output`].
    ///
    /// # Panics
    ///
    /// Debug builds assert that the chunk never exceeds [`CHUNK_LEN`].
    pub fn update(&mut self, mut input: &[u8]) -> &mut Self {
        debug_assert!(self.len() + input.len() <= CHUNK_LEN, "chunk overflow");

        while !input.is_empty() {
            if self.buf_len as usize == BLOCK_LEN {
                self.compress_buffer();
            }
            self.fill_buf(&mut input);
        }
        self
    }

    /// Pending output for the final block, with CHUNK_END set.
    #[must_use]
    pub fn output(&self) -> Output {
        Output::new(
            self.cv,
            self.buf,
            self.buf_len,
            self.chunk_counter,
            self.start_flag() | Flags::CHUNK_END,
        )
    }
}

impl fmt::Debug for ChunkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkState")
            .field("len", &self.len())
            .field("chunk_counter", &self.chunk_counter)
            .finish_non_exhaustive()
    }
}

/// Process a whole chunk in one call.
///
/// `input` must be at most [`CHUNK_LEN`] bytes.
#[must_use]
pub fn chunk_output(input: &[u8], chunk_counter: u64) -> Output {
    let mut state = ChunkState::new(chunk_counter);
    state.update(input);
    state.output()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_empty_chunk_flags() {
        let output = ChunkState::new(0).output();
        assert_eq!(output.flags(), Flags::CHUNK_START | Flags::CHUNK_END);
    }

    #[test]
    fn test_multi_block_chunk_drops_start_flag() {
        let output = chunk_output(&pattern(65), 0);
        assert_eq!(output.flags(), Flags::CHUNK_END);
    }

    #[test]
    fn test_exact_block_is_held_back() {
        let mut state = ChunkState::new(0);
        state.update(&pattern(64));
        assert_eq!(state.len(), 64);
        // A single full block is still the first (and last) block
        assert_eq!(
            state.output().flags(),
            Flags::CHUNK_START | Flags::CHUNK_END
        );
    }

    #[test]
    fn test_split_updates_match_single_update() {
        let data = pattern(CHUNK_LEN);
        let whole = chunk_output(&data, 3).chaining_value();

        for split in [0, 1, 63, 64, 65, 500, 1023, 1024] {
            let mut state = ChunkState::new(3);
            state.update(&data[..split]);
            state.update(&data[split..]);
            assert_eq!(state.output().chaining_value(), whole, "split at {split}");
        }
    }

    #[test]
    fn test_counter_separates_chunks() {
        let data = pattern(100);
        let a = chunk_output(&data, 0).chaining_value();
        let b = chunk_output(&data, 1).chaining_value();
        assert_ne!(a, b);
    }

    #[test]
    fn test_root_and_interior_differ() {
        let output = chunk_output(b"abc", 0);
        let interior = compress::le_bytes_from_words_32(&output.chaining_value());
        assert_ne!(output.root_digest().as_bytes(), &interior);
    }

    #[test]
    fn test_root_output_block_starts_with_digest() {
        let output = chunk_output(&pattern(200), 0);
        let block = output.root_output_block(0);
        assert_eq!(&block[..OUT_LEN], output.root_digest().as_bytes());
    }

    #[test]
    fn test_len_tracking() {
        let mut state = ChunkState::new(0);
        assert!(state.is_empty());
        state.update(&[0u8; 10]);
        assert_eq!(state.len(), 10);
        state.update(&[0u8; 100]);
        assert_eq!(state.len(), 110);
        state.update(&[0u8; CHUNK_LEN - 110]);
        assert_eq!(state.len(), CHUNK_LEN);
    }
}
