//! # devwallet-core
//! Foundation types for the devwallet session: lamport amounts, base58
//! pubkeys and signatures, ed25519 keypairs, System-program transfer
//! messages, and the error taxonomy shared by every other crate.

pub mod address;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod transaction;
pub mod types;

pub use address::Pubkey;
pub use constants::{Cluster, Commitment, LAMPORTS_PER_SOL};
pub use crypto::{KeyPair, TxSignature};
pub use error::{AddressError, KeyError, LedgerError, ProviderError, TransactionError};
pub use transaction::{Blockhash, SignedTransaction, TransferMessage};
pub use types::{format_sol, lamports_to_sol, Balance};
