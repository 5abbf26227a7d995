//! The transport seam between [`LedgerClient`](crate::LedgerClient) and a
//! concrete ledger.

use async_trait::async_trait;

use devwallet_core::{Blockhash, Commitment, LedgerError, Pubkey, SignedTransaction, TxSignature};

/// Where a submitted signature stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureStatus {
    pub slot: u64,
    /// Highest commitment reached so far.
    pub commitment: Commitment,
    /// Set when the transaction executed and failed.
    pub err: Option<String>,
}

impl SignatureStatus {
    /// Whether the transaction landed without error at `target` or better.
    pub fn satisfies(&self, target: Commitment) -> bool {
        self.err.is_none() && self.commitment >= target
    }
}

/// Typed access to a ledger. Implementations never return raw JSON.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn get_balance(&self, address: &Pubkey, commitment: Commitment) -> Result<u64, LedgerError>;

    /// Ask the faucet for `lamports`. Returns the airdrop signature.
    async fn request_airdrop(
        &self,
        address: &Pubkey,
        lamports: u64,
        commitment: Commitment,
    ) -> Result<TxSignature, LedgerError>;

    async fn latest_blockhash(&self, commitment: Commitment) -> Result<Blockhash, LedgerError>;

    async fn send_transaction(
        &self,
        transaction: &SignedTransaction,
        commitment: Commitment,
    ) -> Result<TxSignature, LedgerError>;

    /// `None` when the ledger has not seen the signature yet.
    async fn signature_status(&self, signature: &TxSignature) -> Result<Option<SignatureStatus>, LedgerError>;
}
