//! Incremental (streaming) hasher.
//!
//! Input is buffered one chunk at a time. A chunk is sealed only when
//! more input arrives after it, so the last chunk is always still open
//! at [`Hasher::finalize`] and can take the ROOT flag if it turns out to
//! be the only one. Sealed chunk values go through the [`SubtreeStack`].

use std::fmt;
use std::io::{self, Read, Write};

use tracing::{trace, warn};

use crate::CHUNK_LEN;
use crate::chunk::{ChunkState, Output};
use crate::compress::CvWords;
use crate::digest::Digest;
use crate::error::{HashError, Result};
use crate::parallel;
use crate::tree::SubtreeStack;

/// Lifecycle of a [`Hasher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HasherState {
    /// Fresh or reset; nothing absorbed
    Empty,
    /// At least one `update` since the last reset
    Accumulating,
    /// `finalize` has produced a digest; only `reset` is allowed
    Finalized,
}

impl fmt::Display for HasherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Accumulating => "accumulating",
            Self::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

/// Streaming BLAKE3 hasher.
///
/// The digest does not depend on how the input is split across
/// [`Hasher::update`] calls. A hasher is single-owner: hash concurrent
/// inputs with one hasher each.
///
/// # Example
///
/// ```
/// use rasmx_blake3::{Hasher, HasherState};
///
/// let mut hasher = Hasher::new();
/// for byte in b"hello world" {
///     hasher.update(&[*byte])?;
/// }
/// let digest = hasher.finalize()?;
/// assert_eq!(hasher.state(), HasherState::Finalized);
/// assert_eq!(digest, rasmx_blake3::hash(b"hello world"));
/// # Ok::<(), rasmx_blake3::HashError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Hasher {
    chunk: ChunkState,
    stack: SubtreeStack,
    state: HasherState,
}

impl Hasher {
    /// Create an empty hasher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunk: ChunkState::new(0),
            stack: SubtreeStack::new(),
            state: HasherState::Empty,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> HasherState {
        self.state
    }

    /// Total bytes absorbed since creation or the last reset.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.chunk.chunk_counter() * CHUNK_LEN as u64 + self.chunk.len() as u64
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        if self.state == HasherState::Finalized {
            warn!("rejected {} on finalized hasher", operation);
            return Err(HashError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Absorb more input.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidState`] if the hasher is finalized.
    pub fn update(&mut self, input: &[u8]) -> Result<&mut Self> {
        self.ensure_open("update")?;
        self.absorb(input);
        self.state = HasherState::Accumulating;
        Ok(self)
    }

    /// Absorb input, hashing complete subtrees on the current rayon pool.
    ///
    /// Produces the same state as [`Hasher::update`]; only worth it for
    /// inputs of many chunks.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidState`] if the hasher is finalized.
    pub fn update_parallel(&mut self, input: &[u8]) -> Result<&mut Self> {
        self.ensure_open("update")?;
        parallel::absorb(self, input);
        self.state = HasherState::Accumulating;
        Ok(self)
    }

    /// Stream everything from `reader` into the hasher.
    ///
    /// Returns the number of bytes read.
    ///
    /// # Errors
    ///
    /// Propagates read errors, and fails with [`io::ErrorKind::Other`] if
    /// the hasher is finalized.
    pub fn update_reader<R: Read>(&mut self, mut reader: R) -> io::Result<u64> {
        self.ensure_open("update")?;
        io::copy(&mut reader, self)
    }

    /// Produce the digest and move to [`HasherState::Finalized`].
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidState`] if called twice without a
    /// [`Hasher::reset`] in between.
    pub fn finalize(&mut self) -> Result<Digest> {
        self.ensure_open("finalize")?;
        let digest = self.root_digest();
        self.state = HasherState::Finalized;
        trace!(bytes = self.count(), "hasher finalized");
        Ok(digest)
    }

    /// Return to [`HasherState::Empty`] for reuse.
    pub fn reset(&mut self) -> &mut Self {
        self.chunk = ChunkState::new(0);
        self.stack.clear();
        self.state = HasherState::Empty;
        self
    }

    fn root_output(&self) -> Output {
        self.stack.fold_into(self.chunk.output())
    }

    /// Digest of everything absorbed so far, without a state change.
    pub(crate) fn root_digest(&self) -> Digest {
        self.root_output().root_digest()
    }

    pub(crate) fn absorb(&mut self, mut input: &[u8]) {
        while !input.is_empty() {
            if self.chunk.len() == CHUNK_LEN {
                self.seal_chunk();
            }
            let take = (CHUNK_LEN - self.chunk.len()).min(input.len());
            self.chunk.update(&input[..take]);
            input = &input[take..];
        }
    }

    /// Seal the (full) open chunk as a non-final chunk.
    pub(crate) fn seal_chunk(&mut self) {
        debug_assert_eq!(self.chunk.len(), CHUNK_LEN);
        let cv = self.chunk.output().chaining_value();
        let chunks_after = self.chunk.chunk_counter() + 1;
        trace!(chunk = chunks_after - 1, "sealed chunk");
        self.stack.push_chunk(cv, chunks_after);
        self.chunk = ChunkState::new(chunks_after);
    }

    /// Push an externally hashed subtree that starts at the open chunk.
    ///
    /// The open chunk must be empty.
    pub(crate) fn push_subtree(&mut self, cv: CvWords, subtree_chunks: u64) {
        debug_assert!(self.chunk.is_empty());
        let chunks_after = self.chunk.chunk_counter() + subtree_chunks;
        self.stack.push_subtree(cv, chunks_after, subtree_chunks);
        self.chunk = ChunkState::new(chunks_after);
    }

    pub(crate) fn open_chunk_len(&self) -> usize {
        self.chunk.len()
    }

    pub(crate) fn chunks_completed(&self) -> u64 {
        self.chunk.chunk_counter()
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn digest_of(data: &[u8]) -> Digest {
        let mut hasher = Hasher::new();
        hasher.update(data).unwrap();
        hasher.finalize().unwrap()
    }

    #[test]
    fn test_empty_input_digest() {
        let mut hasher = Hasher::new();
        let digest = hasher.finalize().unwrap();
        assert_eq!(
            digest.to_hex(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn test_state_transitions() {
        let mut hasher = Hasher::new();
        assert_eq!(hasher.state(), HasherState::Empty);

        hasher.update(b"abc").unwrap();
        assert_eq!(hasher.state(), HasherState::Accumulating);

        hasher.finalize().unwrap();
        assert_eq!(hasher.state(), HasherState::Finalized);

        hasher.reset();
        assert_eq!(hasher.state(), HasherState::Empty);
        assert_eq!(hasher.count(), 0);
    }

    #[test]
    fn test_update_after_finalize_fails() {
        let mut hasher = Hasher::new();
        hasher.update(b"data").unwrap();
        hasher.finalize().unwrap();

        let err = hasher.update(b"more").unwrap_err();
        assert!(matches!(
            err,
            HashError::InvalidState {
                operation: "update",
                state: HasherState::Finalized
            }
        ));
    }

    #[test]
    fn test_double_finalize_fails() {
        let mut hasher = Hasher::new();
        hasher.finalize().unwrap();

        let err = hasher.finalize().unwrap_err();
        assert!(matches!(
            err,
            HashError::InvalidState {
                operation: "finalize",
                ..
            }
        ));
    }

    #[test]
    fn test_byte_at_a_time_matches_bulk() {
        let data = b"hello world";
        let mut hasher = Hasher::new();
        for byte in data {
            hasher.update(&[*byte]).unwrap();
        }
        assert_eq!(hasher.finalize().unwrap(), digest_of(data));
    }

    #[test]
    fn test_chunk_boundary_splits() {
        let data = pattern(3 * CHUNK_LEN + 17);
        let expected = digest_of(&data);

        for split in [1, 63, 64, 1023, 1024, 1025, 2048, 3 * CHUNK_LEN] {
            let mut hasher = Hasher::new();
            hasher.update(&data[..split]).unwrap();
            hasher.update(&data[split..]).unwrap();
            assert_eq!(hasher.finalize().unwrap(), expected, "split at {split}");
        }
    }

    #[test]
    fn test_exact_chunk_is_not_sealed_early() {
        let mut hasher = Hasher::new();
        hasher.update(&pattern(CHUNK_LEN)).unwrap();
        assert_eq!(hasher.chunks_completed(), 0);
        assert_eq!(hasher.open_chunk_len(), CHUNK_LEN);

        hasher.update(&[0]).unwrap();
        assert_eq!(hasher.chunks_completed(), 1);
        assert_eq!(hasher.open_chunk_len(), 1);
    }

    #[test]
    fn test_count_tracks_bytes() {
        let mut hasher = Hasher::new();
        hasher.update(&pattern(1000)).unwrap();
        hasher.update(&pattern(2000)).unwrap();
        assert_eq!(hasher.count(), 3000);
    }

    #[test]
    fn test_reset_reuse_matches_fresh() {
        let mut reused = Hasher::new();
        reused.update(&pattern(5000)).unwrap();
        reused.finalize().unwrap();
        reused.reset();
        reused.update(b"second input").unwrap();

        assert_eq!(reused.finalize().unwrap(), digest_of(b"second input"));
    }

    #[test]
    fn test_reset_from_accumulating() {
        let mut hasher = Hasher::new();
        hasher.update(&pattern(4096)).unwrap();
        hasher.reset();
        assert_eq!(hasher.finalize().unwrap(), digest_of(b""));
    }

    #[test]
    fn test_io_write_and_reader() {
        let data = pattern(10_000);

        let mut writer = Hasher::new();
        writer.write_all(&data).unwrap();

        let mut reader = Hasher::new();
        let read = reader.update_reader(&data[..]).unwrap();

        assert_eq!(read, data.len() as u64);
        assert_eq!(writer.finalize().unwrap(), reader.finalize().unwrap());
    }

    #[test]
    fn test_io_write_after_finalize_is_error() {
        let mut hasher = Hasher::new();
        hasher.finalize().unwrap();
        let err = hasher.write_all(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(HasherState::Empty.to_string(), "empty");
        assert_eq!(HasherState::Accumulating.to_string(), "accumulating");
        assert_eq!(HasherState::Finalized.to_string(), "finalized");
    }
}
