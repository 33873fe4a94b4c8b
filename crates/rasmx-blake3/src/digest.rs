//! 32-byte digest value.

use std::fmt;
use std::str::FromStr;

use subtle::ConstantTimeEq;

use crate::OUT_LEN;
use crate::error::HashError;

/// Final BLAKE3 output.
///
/// Equality is constant-time. Displayed as lowercase hex.
#[derive(Clone, Copy)]
pub struct Digest([u8; OUT_LEN]);

impl Digest {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; OUT_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; OUT_LEN] {
        &self.0
    }

    /// Lowercase hexadecimal encoding (64 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex string (either case).
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidHex`] on a bad character or length.
    pub fn from_hex(s: impl AsRef<[u8]>) -> Result<Self, HashError> {
        let mut bytes = [0u8; OUT_LEN];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl From<[u8; OUT_LEN]> for Digest {
    fn from(bytes: [u8; OUT_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<Digest> for [u8; OUT_LEN] {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl PartialEq for Digest {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl PartialEq<[u8; OUT_LEN]> for Digest {
    fn eq(&self, other: &[u8; OUT_LEN]) -> bool {
        self.0.ct_eq(other).into()
    }
}

impl Eq for Digest {}

impl std::hash::Hash for Digest {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl FromStr for Digest {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}
