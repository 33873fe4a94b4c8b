//! Tree reduction.
//!
//! Parent nodes combine two child chaining values with the PARENT flag
//! and a zero counter. Completed subtrees wait on a [`SubtreeStack`]
//! until their sibling is complete.

use crate::BLOCK_LEN;
use crate::MAX_DEPTH;
use crate::chunk::Output;
use crate::compress::{CvWords, Flags, IV, compress, le_bytes_from_words_32};

fn parent_block(left: &CvWords, right: &CvWords) -> [u8; BLOCK_LEN] {
    let mut block = [0u8; BLOCK_LEN];
    block[..32].copy_from_slice(&le_bytes_from_words_32(left));
    block[32..].copy_from_slice(&le_bytes_from_words_32(right));
    block
}

/// Pending parent node over `left` and `right`.
#[must_use]
pub fn parent_output(left: &CvWords, right: &CvWords) -> Output {
    Output::new(IV, parent_block(left, right), BLOCK_LEN as u8, 0, Flags::PARENT)
}

/// Merge two children into their parent's chaining value.
///
/// PARENT is always set and the counter is always zero; `flags` adds to
/// that, e.g. [`Flags::ROOT`] for the last merge of a whole input.
#[must_use]
pub fn merge_parents(left: &CvWords, right: &CvWords, flags: Flags) -> CvWords {
    compress(
        &IV,
        &parent_block(left, right),
        BLOCK_LEN as u8,
        0,
        Flags::PARENT | flags,
    )
}

/// Chaining value of an interior parent node.
#[must_use]
pub fn parent_cv(left: &CvWords, right: &CvWords) -> CvWords {
    merge_parents(left, right, Flags::empty())
}

/// Completed subtrees not yet merged with a sibling.
///
/// Entry `k` from the bottom covers the `k`-th highest set bit of the
/// chunk count, so the stack holds exactly `count.count_ones()` values
/// and never more than [`MAX_DEPTH`].
#[derive(Clone)]
pub struct SubtreeStack {
    cvs: [CvWords; MAX_DEPTH],
    len: u8,
}

impl SubtreeStack {
    /// Empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cvs: [[0; 8]; MAX_DEPTH],
            len: 0,
        }
    }

    /// Number of pending subtrees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    fn push(&mut self, cv: CvWords) {
        debug_assert!((self.len as usize) < MAX_DEPTH, "subtree stack overflow");
        self.cvs[self.len as usize] = cv;
        self.len += 1;
    }

    fn pop(&mut self) -> Option<CvWords> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.cvs[self.len as usize])
    }

    /// Push a completed subtree and merge equal-sized neighbours.
    ///
    /// `subtree_chunks` is the subtree's size in chunks (a power of two)
    /// and `chunks_after` the total chunk count including it. The subtree
    /// must start at a multiple of its own size.
    pub fn push_subtree(&mut self, mut cv: CvWords, chunks_after: u64, subtree_chunks: u64) {
        debug_assert!(subtree_chunks.is_power_of_two());
        debug_assert_eq!(chunks_after % subtree_chunks, 0, "misaligned subtree");

        // Each trailing zero above the subtree's own level is a sibling
        // that just became complete.
        let mut units = chunks_after >> subtree_chunks.trailing_zeros();
        while units & 1 == 0 {
            let Some(left) = self.pop() else {
                break;
            };
            cv = parent_cv(&left, &cv);
            units >>= 1;
        }
        self.push(cv);
    }

    /// Push one completed chunk; `chunks_after` counts it.
    pub fn push_chunk(&mut self, cv: CvWords, chunks_after: u64) {
        self.push_subtree(cv, chunks_after, 1);
    }

    /// Fold the stack into `last`, newest entry first.
    ///
    /// The returned output is the root candidate: ROOT is applied only when
    /// the caller asks it for a digest.
    #[must_use]
    pub fn fold_into(&self, last: Output) -> Output {
        let mut output = last;
        for left in self.cvs[..self.len()].iter().rev() {
            output = parent_output(left, &output.chaining_value());
        }
        output
    }
}

impl Default for SubtreeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SubtreeStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubtreeStack")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Largest power of two less than or equal to `n` (`n > 0`).
#[must_use]
pub fn largest_power_of_two_leq(n: u64) -> u64 {
    debug_assert!(n > 0);
    1 << (63 - n.leading_zeros())
}
