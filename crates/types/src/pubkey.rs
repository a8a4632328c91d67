//! BLS validator public key.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of a compressed BLS12-381 public key.
pub const VALIDATOR_PUBKEY_LEN: usize = 48;

/// Compressed BLS public key identifying a validator on both layers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValidatorPubkey(pub [u8; VALIDATOR_PUBKEY_LEN]);

/// Errors parsing a validator public key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PubkeyError {
    /// Input was not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded input had the wrong length.
    #[error("invalid pubkey length: expected {VALIDATOR_PUBKEY_LEN}, got {0}")]
    InvalidLength(usize),
}

impl ValidatorPubkey {
    /// All-zero key. Never a valid BLS point; used as a placeholder in tests.
    pub const ZERO: Self = Self([0u8; VALIDATOR_PUBKEY_LEN]);

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; VALIDATOR_PUBKEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a byte slice, checking the length.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, PubkeyError> {
        let arr: [u8; VALIDATOR_PUBKEY_LEN] = bytes
            .try_into()
            .map_err(|_| PubkeyError::InvalidLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; VALIDATOR_PUBKEY_LEN] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex, the form the beacon API expects.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl AsRef<[u8]> for ValidatorPubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ValidatorPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidatorPubkey(0x{})", hex::encode(&self.0[..6]))
    }
}

impl fmt::Display for ValidatorPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ValidatorPubkey {
    type Err = PubkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| PubkeyError::InvalidHex(e.to_string()))?;
        Self::try_from_slice(&bytes)
    }
}

impl From<[u8; VALIDATOR_PUBKEY_LEN]> for ValidatorPubkey {
    fn from(bytes: [u8; VALIDATOR_PUBKEY_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for ValidatorPubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ValidatorPubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pubkey_hex_roundtrip() {
        let key = ValidatorPubkey::from_bytes([0xab; VALIDATOR_PUBKEY_LEN]);
        let s = key.to_string();
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 2 + VALIDATOR_PUBKEY_LEN * 2);
        assert_eq!(s.parse::<ValidatorPubkey>().unwrap(), key);
    }

    #[test]
    fn test_pubkey_parse_without_prefix() {
        let hex_str = "11".repeat(VALIDATOR_PUBKEY_LEN);
        let key: ValidatorPubkey = hex_str.parse().unwrap();
        assert_eq!(key.as_bytes()[0], 0x11);
    }

    #[test]
    fn test_pubkey_wrong_length() {
        let err = ValidatorPubkey::try_from_slice(&[1u8; 32]).unwrap_err();
        assert_eq!(err, PubkeyError::InvalidLength(32));
    }

    #[test]
    fn test_pubkey_invalid_hex() {
        assert!(matches!(
            "0xzz".parse::<ValidatorPubkey>(),
            Err(PubkeyError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_pubkey_json() {
        let key = ValidatorPubkey::from_bytes([7; VALIDATOR_PUBKEY_LEN]);
        let json = serde_json::to_string(&key).unwrap();
        let back: ValidatorPubkey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, back);
    }
}
