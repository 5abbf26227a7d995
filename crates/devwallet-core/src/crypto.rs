//! Ed25519 keys and signatures.
//!
//! Key generation and signing are delegated to ed25519-dalek; this module
//! only wraps them in the shapes the rest of the workspace needs:
//!
//! - [`KeyPair`] for the ephemeral wallet and the keypair-file provider
//! - [`TxSignature`], the base58 64-byte signature that doubles as a
//!   transaction id
//! - [`parse_keypair_json`] for the `[u8; 64]` JSON array written by the
//!   Solana CLI (`secret || public`)

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroize;

use crate::address::Pubkey;
use crate::constants::{KEYPAIR_LEN, SIGNATURE_LEN};
use crate::error::{AddressError, KeyError};

/// Ed25519 keypair.
///
/// The secret key is zeroized on drop by the underlying library. `Debug`
/// only ever prints the public half.
pub struct KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl KeyPair {
    /// Generate a random keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a keypair from 32-byte secret key material.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(&bytes),
        }
    }

    /// Create a keypair from the 64-byte `secret || public` layout,
    /// rejecting pairs whose halves do not belong together.
    pub fn from_keypair_bytes(bytes: &[u8; KEYPAIR_LEN]) -> Result<Self, KeyError> {
        let signing_key = ed25519_dalek::SigningKey::from_keypair_bytes(bytes)
            .map_err(|_| KeyError::Mismatch)?;
        Ok(Self { signing_key })
    }

    /// The account address controlled by this keypair.
    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> TxSignature {
        TxSignature(self.signing_key.sign(message).to_bytes())
    }

    /// The 64-byte `secret || public` layout. Handle with care.
    pub fn to_keypair_bytes(&self) -> [u8; KEYPAIR_LEN] {
        self.signing_key.to_keypair_bytes()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

/// Parse a Solana CLI keypair file body (JSON array of 64 integers).
///
/// Intermediate buffers holding secret bytes are zeroized before returning.
pub fn parse_keypair_json(body: &str) -> Result<KeyPair, KeyError> {
    let mut bytes: Vec<u8> =
        serde_json::from_str(body).map_err(|e| KeyError::Malformed(e.to_string()))?;
    if bytes.len() != KEYPAIR_LEN {
        let got = bytes.len();
        bytes.zeroize();
        return Err(KeyError::InvalidLength {
            expected: KEYPAIR_LEN,
            got,
        });
    }
    let mut array = [0u8; KEYPAIR_LEN];
    array.copy_from_slice(&bytes);
    bytes.zeroize();
    let result = KeyPair::from_keypair_bytes(&array);
    array.zeroize();
    result
}

/// Render a keypair in the Solana CLI file format.
pub fn keypair_to_json(keypair: &KeyPair) -> String {
    let mut bytes = keypair.to_keypair_bytes();
    let json = serde_json::to_string(&bytes[..]).unwrap_or_default();
    bytes.zeroize();
    json
}

/// Verify `signature` over `message` against `signer`.
pub fn verify(signer: &Pubkey, message: &[u8], signature: &TxSignature) -> Result<(), KeyError> {
    let vk = ed25519_dalek::VerifyingKey::from_bytes(signer.as_bytes())
        .map_err(|_| KeyError::InvalidPublicKey)?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    vk.verify(message, &sig).map_err(|_| KeyError::Mismatch)
}

/// A 64-byte ed25519 signature. The first signature of a transaction is
/// its id on the ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxSignature([u8; SIGNATURE_LEN]);

impl TxSignature {
    pub const fn new(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    pub fn encode(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl FromStr for TxSignature {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;
        let array: [u8; SIGNATURE_LEN] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| AddressError::InvalidLength {
                    expected: SIGNATURE_LEN,
                    got: bytes.len(),
                })?;
        Ok(Self(array))
    }
}

impl fmt::Display for TxSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for TxSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxSignature({})", self.encode())
    }
}

impl Serialize for TxSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for TxSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
