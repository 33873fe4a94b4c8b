//! Parallel subtree hashing.
//!
//! Input is cut into disjoint ranges that are each a complete subtree of
//! 2^k chunks starting at a multiple of 2^k chunks. Those ranges are
//! exactly the nodes the sequential hasher would build, so hashing them
//! independently on rayon and pushing their chaining values onto the
//! [`SubtreeStack`](crate::tree::SubtreeStack) in order gives the same
//! digest as [`Hasher::update`].
//!
//! At least one byte is always left for the open chunk, so the ROOT
//! decision still happens in [`Hasher::finalize`].

use rayon::prelude::*;
use tracing::debug;

use crate::CHUNK_LEN;
use crate::chunk::chunk_output;
use crate::compress::CvWords;
use crate::digest::Digest;
use crate::hasher::Hasher;
use crate::tree::{largest_power_of_two_leq, parent_cv};

/// Subtrees at or below this many chunks are hashed on one thread.
const SERIAL_SUBTREE_CHUNKS: u64 = 16;

/// One independent unit of work.
#[derive(Debug, Clone, Copy)]
struct Segment<'a> {
    input: &'a [u8],
    chunk_counter: u64,
    chunks: u64,
}

/// Hash `input` on the current rayon pool.
///
/// Same result as [`crate::hash`] for every input.
#[must_use]
pub fn hash_parallel(input: &[u8]) -> Digest {
    let mut hasher = Hasher::new();
    absorb(&mut hasher, input);
    hasher.root_digest()
}

/// Absorb `input` into `hasher`, splitting complete subtrees across rayon.
pub(crate) fn absorb(hasher: &mut Hasher, mut input: &[u8]) {
    // Top up a partially filled chunk first.
    let open = hasher.open_chunk_len();
    if open > 0 && open < CHUNK_LEN {
        let take = (CHUNK_LEN - open).min(input.len());
        hasher.absorb(&input[..take]);
        input = &input[take..];
    }
    if input.is_empty() {
        return;
    }
    if hasher.open_chunk_len() == CHUNK_LEN {
        hasher.seal_chunk();
    }

    let segments = split_segments(input, hasher.chunks_completed());
    if segments.is_empty() {
        hasher.absorb(input);
        return;
    }

    let consumed: usize = segments.iter().map(|s| s.input.len()).sum();
    debug!(
        segments = segments.len(),
        bytes = consumed,
        threads = rayon::current_num_threads(),
        "hashing subtrees in parallel"
    );

    let cvs: Vec<CvWords> = segments
        .par_iter()
        .map(|segment| subtree_cv(segment.input, segment.chunk_counter))
        .collect();

    // Single sequential merge pass, in input order.
    for (segment, cv) in segments.iter().zip(cvs) {
        hasher.push_subtree(cv, segment.chunks);
    }

    hasher.absorb(&input[consumed..]);
}

/// Cut `input` into aligned complete subtrees, leaving a non-empty tail.
fn split_segments(input: &[u8], first_chunk: u64) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut counter = first_chunk;
    let mut rest = input;

    while rest.len() > CHUNK_LEN {
        // Full chunks that can be sealed while keeping >= 1 byte back.
        let sealable = ((rest.len() - 1) / CHUNK_LEN) as u64;
        let mut chunks = largest_power_of_two_leq(sealable);
        while counter % chunks != 0 {
            chunks /= 2;
        }

        let len = chunks as usize * CHUNK_LEN;
        segments.push(Segment {
            input: &rest[..len],
            chunk_counter: counter,
            chunks,
        });
        counter += chunks;
        rest = &rest[len..];
    }

    segments
}

/// Chaining value of a complete subtree of 2^k chunks.
fn subtree_cv(input: &[u8], chunk_counter: u64) -> CvWords {
    if input.len() <= CHUNK_LEN {
        return chunk_output(input, chunk_counter).chaining_value();
    }

    let half = input.len() / 2;
    debug_assert_eq!(half % CHUNK_LEN, 0);
    let (left, right) = input.split_at(half);
    let right_counter = chunk_counter + (half / CHUNK_LEN) as u64;

    let (left_cv, right_cv) = if (input.len() / CHUNK_LEN) as u64 > SERIAL_SUBTREE_CHUNKS {
        rayon::join(
            || subtree_cv(left, chunk_counter),
            || subtree_cv(right, right_counter),
        )
    } else {
        (
            subtree_cv(left, chunk_counter),
            subtree_cv(right, right_counter),
        )
    };
    parent_cv(&left_cv, &right_cv)
}
