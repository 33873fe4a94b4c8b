//! Engine error types.

use thiserror::Error;

use crate::hasher::HasherState;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, HashError>;

/// Engine errors
#[derive(Debug, Error)]
pub enum HashError {
    /// Operation not valid in the hasher's current state
    #[error("invalid state for operation: cannot {operation} a {state} hasher")]
    InvalidState {
        /// Operation attempted
        operation: &'static str,
        /// State the hasher was in
        state: HasherState,
    },

    /// Engine configuration rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dedicated worker pool could not be created
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    /// Background hash task ended without producing a digest
    #[error("hash task aborted before completion")]
    TaskAborted,

    /// Malformed hexadecimal digest
    #[error("invalid hex digest: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

impl From<HashError> for std::io::Error {
    fn from(err: HashError) -> Self {
        std::io::Error::other(err)
    }
}
