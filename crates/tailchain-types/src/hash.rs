use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Width of every digest in the chain, in bytes.
pub const HASH_LEN: usize = 32;

/// Fixed-width digest identifying an entry or a content payload.
///
/// Equality, ordering, and map keys all use the raw bytes. Hex encoding only
/// happens at the edges (wire headers, URLs, logs, JSON dumps), which is why
/// serde goes through the hex form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainHash([u8; HASH_LEN]);

impl ChainHash {
    /// Wrap a pre-computed digest.
    pub const fn from_hash(hash: [u8; HASH_LEN]) -> Self {
        Self(hash)
    }

    /// Copy a digest out of a byte slice of exactly [`HASH_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        let arr: [u8; HASH_LEN] = bytes.try_into().map_err(|_| TypeError::InvalidLength {
            expected: HASH_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters), for logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string of exactly 64 characters.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainHash({})", self.short_hex())
    }
}

impl fmt::Display for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ChainHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; HASH_LEN]> for ChainHash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<ChainHash> for [u8; HASH_LEN] {
    fn from(hash: ChainHash) -> Self {
        hash.0
    }
}

impl AsRef<[u8]> for ChainHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<String> for ChainHash {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<ChainHash> for String {
    fn from(hash: ChainHash) -> Self {
        hash.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hex_roundtrip() {
        let hash = ChainHash::from_hash([0xAB; 32]);
        let parsed = ChainHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn short_hex_is_8_chars() {
        let hash = ChainHash::from_hash([7; 32]);
        assert_eq!(hash.short_hex(), "07070707");
    }

    #[test]
    fn display_is_full_hex() {
        let hash = ChainHash::from_hash([1; 32]);
        let display = format!("{hash}");
        assert_eq!(display.len(), 64);
        assert_eq!(display, hash.to_hex());
    }

    #[test]
    fn rejects_bad_hex() {
        let err = ChainHash::from_hex("zz").unwrap_err();
        assert!(matches!(err, TypeError::InvalidHex(_)));
    }

    #[test]
    fn rejects_wrong_length() {
        let err = ChainHash::from_hex("abcd").unwrap_err();
        assert_eq!(err, TypeError::InvalidLength { expected: 32, actual: 2 });
    }

    #[test]
    fn empty_string_is_wrong_length() {
        let err = ChainHash::from_hex("").unwrap_err();
        assert_eq!(err, TypeError::InvalidLength { expected: 32, actual: 0 });
    }

    #[test]
    fn serde_uses_hex() {
        let hash = ChainHash::from_hash([0x0F; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "0f".repeat(32)));
        let parsed: ChainHash = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn uppercase_hex_parses_to_same_bytes() {
        let hash = ChainHash::from_hash([0xCD; 32]);
        let upper = hash.to_hex().to_uppercase();
        assert_eq!(upper.parse::<ChainHash>().unwrap(), hash);
    }

    proptest! {
        #[test]
        fn single_byte_flip_never_equal(bytes in any::<[u8; 32]>(), index in 0usize..32) {
            let original = ChainHash::from_hash(bytes);
            let mut flipped = bytes;
            flipped[index] ^= 0x01;
            prop_assert_ne!(original, ChainHash::from_hash(flipped));
        }
    }
}
