//! The content hash type used by SurfStore (SHA-256, hex-encoded).

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

/// A SHA-256 content hash, the identity of a block.
///
/// Printed and parsed as 64 lowercase hex characters, matching the wire
/// representation used by the BlockStore/MetadataStore RPC surface.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Hash([u8; 32]);

#[derive(thiserror::Error, Debug)]
pub enum HashParseError {
    #[error("invalid hex in hash: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid hash length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

impl Hash {
    /// Computes the SHA-256 hash of `bytes`.
    pub fn of(bytes: impl AsRef<[u8]>) -> Self {
        let digest = Sha256::digest(bytes.as_ref());
        Self(digest.into())
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex representation, the form this hash takes on the wire
    /// and as a filename for the client's local block cache.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn parse_hex(s: &str) -> Result<Self, HashParseError> {
        let bytes = hex::decode(s)?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| HashParseError::InvalidLength(v.len()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hash").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::parse_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_empty_string_to_known_sha256() {
        let h = Hash::of(b"");
        assert_eq!(
            h.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hex_roundtrip() {
        let h = Hash::of(b"surfstore");
        let s = h.to_hex();
        let parsed = Hash::parse_hex(&s).unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn rejects_short_hex() {
        assert!(Hash::parse_hex("abcd").is_err());
    }
}
