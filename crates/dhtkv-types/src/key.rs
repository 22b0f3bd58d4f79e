use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Lookup key of an entry in the overlay.
///
/// A `Key` is a 32-byte digest computed by a keyer: the hash of the value for
/// immutable items, or the hash of the owner's public key and qualified name
/// for mutable items. It doubles as the DHT target of put/get rounds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key([u8; 32]);

impl Key {
    /// Create a `Key` from a pre-computed hash.
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// XOR distance to another key, compared lexicographically.
    pub fn distance(&self, other: &Key) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.0[i] ^ other.0[i];
        }
        out
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.short_hex())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Key {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for Key {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let key = Key::from_hash([0xab; 32]);
        let parsed = Key::from_hex(&key.to_hex()).unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn from_str_matches_from_hex() {
        let key = Key::from_hash([7; 32]);
        let parsed: Key = key.to_hex().parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = Key::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn rejects_non_hex() {
        assert!(matches!(
            Key::from_hex("not a key"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn display_is_full_hex() {
        let key = Key::from_hash([1; 32]);
        let display = format!("{key}");
        assert_eq!(display.len(), 64);
        assert_eq!(display, key.to_hex());
    }

    #[test]
    fn debug_is_short() {
        let key = Key::from_hash([0xff; 32]);
        assert_eq!(format!("{key:?}"), "Key(ffffffff)");
    }

    #[test]
    fn distance_to_self_is_zero() {
        let key = Key::from_hash([9; 32]);
        assert_eq!(key.distance(&key), [0u8; 32]);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Key::from_hash([0x0f; 32]);
        let b = Key::from_hash([0xf0; 32]);
        assert_eq!(a.distance(&b), b.distance(&a));
        assert_eq!(a.distance(&b), [0xff; 32]);
    }

    #[test]
    fn serde_roundtrip() {
        let key = Key::from_hash([3; 32]);
        let json = serde_json::to_string(&key).unwrap();
        let parsed: Key = serde_json::from_str(&json).unwrap();
        assert_eq!(key, parsed);
    }
}
