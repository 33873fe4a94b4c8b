//! Property-based tests for the rasmx BLAKE3 engine
//!
//! Uses proptest to verify invariants across large input spaces.

use proptest::prelude::*;
use rasmx_blake3::{CHUNK_LEN, Hasher, hash, hash_parallel};
use rasmx_integration_tests::{hash_split, pattern, reference_hex};

fn input_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..max_len)
}

// ============================================================================
// Streaming Properties
// ============================================================================

mod streaming_properties {
    use super::*;

    proptest! {
        /// The digest does not depend on how input is split across updates
        #[test]
        fn chunking_invariance(
            data in input_strategy(6 * CHUNK_LEN),
            mut offsets in prop::collection::vec(0usize..6 * CHUNK_LEN, 0..8),
        ) {
            offsets.sort_unstable();
            prop_assert_eq!(hash_split(&data, &offsets), hash(&data));
        }

        /// One-shot hashing matches the reference implementation
        #[test]
        fn matches_reference(data in input_strategy(4 * CHUNK_LEN)) {
            prop_assert_eq!(hash(&data).to_hex(), reference_hex(&data));
        }

        /// Hashing the same input twice gives the same digest
        #[test]
        fn deterministic(data in input_strategy(2048)) {
            prop_assert_eq!(hash(&data), hash(&data));
        }

        /// A reset hasher behaves like a fresh one
        #[test]
        fn reset_reuse(
            first in input_strategy(3000),
            second in input_strategy(3000),
        ) {
            let mut hasher = Hasher::new();
            hasher.update(&first).unwrap();
            hasher.finalize().unwrap();
            hasher.reset();
            hasher.update(&second).unwrap();
            prop_assert_eq!(hasher.finalize().unwrap(), hash(&second));
        }

        /// Byte count tracks everything absorbed
        #[test]
        fn count_matches_input(parts in prop::collection::vec(input_strategy(1500), 0..6)) {
            let mut hasher = Hasher::new();
            for part in &parts {
                hasher.update(part).unwrap();
            }
            let total: usize = parts.iter().map(Vec::len).sum();
            prop_assert_eq!(hasher.count(), total as u64);
        }
    }
}

// ============================================================================
// Parallel Properties
// ============================================================================

mod parallel_properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Parallel subtree hashing agrees with the sequential path
        #[test]
        fn parallel_matches_sequential(
            chunks in 0usize..80,
            extra in 0usize..CHUNK_LEN,
            threads in 1usize..6,
        ) {
            let data = pattern(chunks * CHUNK_LEN + extra);
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            prop_assert_eq!(pool.install(|| hash_parallel(&data)), hash(&data));
        }

        /// Mixing sequential and parallel updates keeps the digest
        #[test]
        fn mixed_update_modes(
            prefix in 0usize..(10 * CHUNK_LEN),
            rest in 0usize..(40 * CHUNK_LEN),
        ) {
            let data = pattern(prefix + rest);
            let mut hasher = Hasher::new();
            hasher.update(&data[..prefix]).unwrap();
            hasher.update_parallel(&data[prefix..]).unwrap();
            prop_assert_eq!(hasher.finalize().unwrap(), hash(&data));
        }
    }
}
