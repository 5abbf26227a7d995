//! Account addresses.
//!
//! An address is the raw 32-byte ed25519 public key, rendered as base58
//! (e.g. `11111111111111111111111111111111` for the System program). No
//! checksum or network prefix is involved; the cluster is chosen by the RPC
//! endpoint, not by the address.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{PUBKEY_LEN, SYSTEM_PROGRAM_ID};
use crate::error::AddressError;

/// A 32-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pubkey([u8; PUBKEY_LEN]);

impl Pubkey {
    /// The System program id.
    pub const SYSTEM_PROGRAM: Pubkey = Pubkey(SYSTEM_PROGRAM_ID);

    pub const fn new(bytes: [u8; PUBKEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBKEY_LEN] {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; PUBKEY_LEN] {
        self.0
    }

    /// Base58 form.
    pub fn encode(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// Abbreviated form for log lines and narrow UI cells: `ABCD…WXYZ`.
    pub fn short(&self) -> String {
        let full = self.encode();
        if full.len() <= 10 {
            return full;
        }
        format!("{}…{}", &full[..4], &full[full.len() - 4..])
    }
}

impl FromStr for Pubkey {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;
        let array: [u8; PUBKEY_LEN] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| AddressError::InvalidLength {
                    expected: PUBKEY_LEN,
                    got: bytes.len(),
                })?;
        Ok(Self(array))
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self.encode())
    }
}

impl Serialize for Pubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_program_encodes_as_ones() {
        assert_eq!(
            Pubkey::SYSTEM_PROGRAM.encode(),
            "11111111111111111111111111111111"
        );
    }

    #[test]
    fn parse_roundtrip() {
        let pk = Pubkey::new([7u8; 32]);
        let parsed: Pubkey = pk.encode().parse().unwrap();
        assert_eq!(parsed, pk);
    }

    #[test]
    fn parse_trims_whitespace() {
        let pk = Pubkey::new([9u8; 32]);
        let parsed: Pubkey = format!("  {pk}\n").parse().unwrap();
        assert_eq!(parsed, pk);
    }

    #[test]
    fn parse_rejects_bad_alphabet() {
        // '0', 'O', 'I' and 'l' are not in the base58 alphabet.
        let err = "0OIl".parse::<Pubkey>().unwrap_err();
        assert!(matches!(err, AddressError::InvalidBase58(_)));
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let short = bs58::encode([1u8; 16]).into_string();
        let err = short.parse::<Pubkey>().unwrap_err();
        assert_eq!(
            err,
            AddressError::InvalidLength {
                expected: 32,
                got: 16
            }
        );
    }

    #[test]
    fn short_form() {
        let pk = Pubkey::new([200u8; 32]);
        let full = pk.encode();
        let short = pk.short();
        assert!(short.starts_with(&full[..4]));
        assert!(short.ends_with(&full[full.len() - 4..]));
        assert!(short.contains('…'));
    }

    #[test]
    fn serde_as_base58_string() {
        let pk = Pubkey::new([3u8; 32]);
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{}\"", pk.encode()));
        let back: Pubkey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pk);
    }
}
