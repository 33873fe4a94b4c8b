//! Fuzz target for digest hex parsing
//!
//! Parsing arbitrary text must never panic, and anything that parses must
//! print back to the same lowercase hex.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rasmx_blake3::Digest;

fuzz_target!(|data: &[u8]| {
    if let Ok(digest) = Digest::from_hex(data) {
        let text = digest.to_hex();
        assert_eq!(text.len(), 64);
        assert!(text.eq_ignore_ascii_case(std::str::from_utf8(data).unwrap()));
        assert_eq!(text.parse::<Digest>().unwrap(), digest);
    }
});
