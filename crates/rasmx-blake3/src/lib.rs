//! # rasmx BLAKE3
//!
//! A pure-Rust BLAKE3 hashing engine.
//!
//! This crate provides:
//! - The BLAKE3 compression function and its widened root variant
//! - Chunk processing and parent-node tree reduction
//! - A streaming [`Hasher`] with an explicit `Empty`/`Accumulating`/`Finalized`
//!   state machine
//! - Parallel subtree hashing on rayon for large inputs
//! - One-shot [`hash`] and worker-pool backed [`hash_async`] entry points
//!
//! ## Layout
//!
//! | Layer | Module | Role |
//! |-------|--------|------|
//! | Compression core | [`compress`] | 7-round mixing permutation |
//! | Chunk processor | [`chunk`] | Folds up to 16 blocks into a chunk CV |
//! | Tree reducer | [`tree`] | Parent nodes and the subtree stack |
//! | Incremental hasher | [`hasher`] | `update` / `finalize` / `reset` |
//! | Parallel path | [`parallel`] | Subtree-aligned work splitting |
//! | Engine facade | [`engine`] | Sync and async entry points |
//!
//! ## Example
//!
//! ```
//! use rasmx_blake3::{Hasher, hash};
//!
//! let mut hasher = Hasher::new();
//! hasher.update(b"hello ")?;
//! hasher.update(b"world")?;
//! assert_eq!(hasher.finalize()?, hash(b"hello world"));
//! # Ok::<(), rasmx_blake3::HashError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod chunk;
pub mod compress;
pub mod config;
pub mod digest;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod logging;
pub mod parallel;
pub mod tree;

pub use config::EngineConfig;
pub use digest::Digest;
pub use engine::{Engine, HashTask, hash, hash_async};
pub use error::{HashError, Result};
pub use hasher::{Hasher, HasherState};
pub use logging::{init_logger, init_logger_with};
pub use parallel::hash_parallel;

/// Size of a message block in bytes
pub const BLOCK_LEN: usize = 64;

/// Size of a chunk (one leaf of the hash tree) in bytes
pub const CHUNK_LEN: usize = 1024;

/// Size of a digest in bytes
pub const OUT_LEN: usize = 32;

/// Maximum height of the subtree stack.
///
/// 2^54 chunks of 1 KiB is 2^64 bytes, the largest input a 64-bit
/// counter can describe.
pub const MAX_DEPTH: usize = 54;
