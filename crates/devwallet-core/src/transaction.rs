//! System-program transfer transactions.
//!
//! Only the one transaction shape the session needs is supported: a legacy
//! message with a single signer moving lamports to one receiver.
//!
//! # Wire layout
//!
//! ```text
//! transaction = compact_u16(1) || signature[64] || message
//! message     = header[3] || compact_u16(3) || from || to || system_program
//!               || recent_blockhash[32] || compact_u16(1) || instruction
//! instruction = program_index(2) || compact_u16(2) || [0, 1]
//!               || compact_u16(12) || u32_le(2) || u64_le(lamports)
//! ```
//!
//! The header `[1, 0, 1]` marks one required signature, no read-only
//! signers and one read-only unsigned account (the program).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::address::Pubkey;
use crate::constants::{SIGNATURE_LEN, SYSTEM_TRANSFER_INSTRUCTION};
use crate::crypto::{KeyPair, TxSignature};
use crate::error::{AddressError, TransactionError};

/// Recent blockhash a message commits to. Expires after ~150 slots.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blockhash([u8; 32]);

impl Blockhash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn encode(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl FromStr for Blockhash {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pk: Pubkey = s.parse()?;
        Ok(Self(pk.to_bytes()))
    }
}

impl fmt::Display for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blockhash({})", self.encode())
    }
}

impl Serialize for Blockhash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Blockhash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Append `value` in the compact-u16 ("shortvec") encoding.
pub fn encode_compact_u16(value: u16, out: &mut Vec<u8>) {
    let mut rem = value;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

/// An unsigned lamport transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferMessage {
    pub from: Pubkey,
    pub to: Pubkey,
    pub lamports: u64,
    pub recent_blockhash: Blockhash,
}

impl TransferMessage {
    pub fn new(
        from: Pubkey,
        to: Pubkey,
        lamports: u64,
        recent_blockhash: Blockhash,
    ) -> Result<Self, TransactionError> {
        if lamports == 0 {
            return Err(TransactionError::ZeroAmount);
        }
        if from == to {
            return Err(TransactionError::SelfTransfer);
        }
        Ok(Self {
            from,
            to,
            lamports,
            recent_blockhash,
        })
    }

    /// Serialized message: the exact bytes the fee payer signs.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(150);

        // Header
        out.extend_from_slice(&[1, 0, 1]);

        // Account keys
        encode_compact_u16(3, &mut out);
        out.extend_from_slice(self.from.as_bytes());
        out.extend_from_slice(self.to.as_bytes());
        out.extend_from_slice(Pubkey::SYSTEM_PROGRAM.as_bytes());

        out.extend_from_slice(self.recent_blockhash.as_bytes());

        // One System::Transfer instruction
        encode_compact_u16(1, &mut out);
        out.push(2);
        encode_compact_u16(2, &mut out);
        out.extend_from_slice(&[0, 1]);
        let mut data = Vec::with_capacity(12);
        data.extend_from_slice(&SYSTEM_TRANSFER_INSTRUCTION.to_le_bytes());
        data.extend_from_slice(&self.lamports.to_le_bytes());
        encode_compact_u16(data.len() as u16, &mut out);
        out.extend_from_slice(&data);

        out
    }

    /// Sign with the sender's keypair.
    ///
    /// Fails with [`TransactionError::SignerMismatch`] if `signer` does not
    /// control `from`.
    pub fn sign(self, signer: &KeyPair) -> Result<SignedTransaction, TransactionError> {
        if signer.pubkey() != self.from {
            return Err(TransactionError::SignerMismatch);
        }
        let message = self.serialize();
        let signature = signer.sign(&message);
        Ok(SignedTransaction { signature, message })
    }
}

/// A signed, ready-to-submit transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    signature: TxSignature,
    message: Vec<u8>,
}

impl SignedTransaction {
    /// Assemble from a message and a signature produced elsewhere (e.g. by a
    /// wallet provider).
    pub fn from_parts(message: Vec<u8>, signature: TxSignature) -> Self {
        Self { signature, message }
    }

    /// The transaction id.
    pub fn signature(&self) -> TxSignature {
        self.signature
    }

    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// Full wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + SIGNATURE_LEN + self.message.len());
        encode_compact_u16(1, &mut out);
        out.extend_from_slice(self.signature.as_bytes());
        out.extend_from_slice(&self.message);
        out
    }

    /// Base58 wire form accepted by `sendTransaction`.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.to_bytes()).into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::verify;

    fn sample(lamports: u64) -> (KeyPair, TransferMessage) {
        let kp = KeyPair::from_secret_bytes([11u8; 32]);
        let to = Pubkey::new([22u8; 32]);
        let msg = TransferMessage::new(kp.pubkey(), to, lamports, Blockhash::new([33u8; 32]))
            .unwrap();
        (kp, msg)
    }

    #[test]
    fn compact_u16_vectors() {
        let cases: &[(u16, &[u8])] = &[
            (0, &[0x00]),
            (1, &[0x01]),
            (0x7f, &[0x7f]),
            (0x80, &[0x80, 0x01]),
            (0x3fff, &[0xff, 0x7f]),
            (0x4000, &[0x80, 0x80, 0x01]),
            (0xffff, &[0xff, 0xff, 0x03]),
        ];
        for (value, expected) in cases {
            let mut out = Vec::new();
            encode_compact_u16(*value, &mut out);
            assert_eq!(&out[..], *expected, "value {value}");
        }
    }

    #[test]
    fn message_layout() {
        let (kp, msg) = sample(100_000_000);
        let bytes = msg.serialize();
        assert_eq!(bytes.len(), 150);
        assert_eq!(&bytes[..4], &[1, 0, 1, 3]);
        assert_eq!(&bytes[4..36], kp.pubkey().as_bytes());
        assert_eq!(&bytes[36..68], &[22u8; 32]);
        assert_eq!(&bytes[68..100], &[0u8; 32]);
        assert_eq!(&bytes[100..132], &[33u8; 32]);
        // instruction count, program index, account indices
        assert_eq!(&bytes[132..137], &[1, 2, 2, 0, 1]);
        assert_eq!(bytes[137], 12);
        assert_eq!(&bytes[138..142], &2u32.to_le_bytes());
        assert_eq!(&bytes[142..150], &100_000_000u64.to_le_bytes());
    }

    #[test]
    fn zero_amount_rejected() {
        let err = TransferMessage::new(
            Pubkey::new([1u8; 32]),
            Pubkey::new([2u8; 32]),
            0,
            Blockhash::new([0u8; 32]),
        )
        .unwrap_err();
        assert_eq!(err, TransactionError::ZeroAmount);
    }

    #[test]
    fn self_transfer_rejected() {
        let pk = Pubkey::new([1u8; 32]);
        let err = TransferMessage::new(pk, pk, 5, Blockhash::new([0u8; 32])).unwrap_err();
        assert_eq!(err, TransactionError::SelfTransfer);
    }

    #[test]
    fn signature_covers_message() {
        let (kp, msg) = sample(42);
        let signed = msg.sign(&kp).unwrap();
        assert!(verify(&kp.pubkey(), signed.message(), &signed.signature()).is_ok());
    }

    #[test]
    fn wire_bytes_prefix_signature() {
        let (kp, msg) = sample(42);
        let signed = msg.sign(&kp).unwrap();
        let wire = signed.to_bytes();
        assert_eq!(wire.len(), 1 + 64 + 150);
        assert_eq!(wire[0], 1);
        assert_eq!(&wire[1..65], signed.signature().as_bytes());
        assert_eq!(&wire[65..], signed.message());
        let decoded = bs58::decode(signed.to_base58()).into_vec().unwrap();
        assert_eq!(decoded, wire);
    }

    #[test]
    fn wrong_signer_rejected() {
        let (_, msg) = sample(42);
        let other = KeyPair::from_secret_bytes([99u8; 32]);
        assert_eq!(msg.sign(&other).unwrap_err(), TransactionError::SignerMismatch);
    }

    #[test]
    fn blockhash_parse_roundtrip() {
        let bh = Blockhash::new([44u8; 32]);
        assert_eq!(bh.encode().parse::<Blockhash>().unwrap(), bh);
    }
}
