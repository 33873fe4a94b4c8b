//! Fuzz target for the streaming hasher
//!
//! Splits arbitrary input at arbitrary points and checks the digest against
//! the one-shot path and the reference implementation.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rasmx_blake3::{Hasher, hash};

#[derive(Debug, Arbitrary)]
struct StreamingInput {
    data: Vec<u8>,
    splits: Vec<u16>,
    parallel: bool,
}

fuzz_target!(|input: StreamingInput| {
    let expected = hash(&input.data);
    assert_eq!(expected.as_bytes(), blake3::hash(&input.data).as_bytes());

    let mut hasher = Hasher::new();
    let mut rest = &input.data[..];
    for split in input.splits {
        let take = usize::from(split).min(rest.len());
        let (head, tail) = rest.split_at(take);
        if input.parallel {
            hasher.update_parallel(head).unwrap();
        } else {
            hasher.update(head).unwrap();
        }
        rest = tail;
    }
    hasher.update(rest).unwrap();

    assert_eq!(hasher.count(), input.data.len() as u64);
    assert_eq!(hasher.finalize().unwrap(), expected);
});
