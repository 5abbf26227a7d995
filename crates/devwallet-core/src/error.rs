//! Error types shared across the devwallet crates.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("no supported wallet provider found")] Unavailable,
    #[error("request rejected by the user")] UserRejected,
    #[error("provider error: {0}")] Provider(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("network error: {0}")] Network(String),
    #[error("faucet unavailable: {0}")] FaucetUnavailable(String),
    #[error("confirmation of {signature} timed out after {waited_ms} ms")] ConfirmationTimeout { signature: String, waited_ms: u64 },
    #[error("insufficient funds: {0}")] InsufficientFunds(String),
    #[error("transaction rejected: {0}")] Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid key length: expected {expected}, got {got}")] InvalidLength { expected: usize, got: usize },
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("public half does not match secret half")] Mismatch,
    #[error("malformed keypair: {0}")] Malformed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58: {0}")] InvalidBase58(String),
    #[error("invalid length: expected {expected} bytes, got {got}")] InvalidLength { expected: usize, got: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("transfer amount must be greater than zero")] ZeroAmount,
    #[error("sender and receiver are the same account")] SelfTransfer,
    #[error("signer does not control the sending account")] SignerMismatch,
}
