//! The ledger operations the session relies on.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use devwallet_core::{KeyPair, LedgerError, Pubkey, TransactionError, TransferMessage, TxSignature};

use crate::config::LedgerConfig;
use crate::rpc::RpcLedger;
use crate::transport::Ledger;

/// A submitted operation whose effect is not yet trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationHandle {
    signature: TxSignature,
}

impl ConfirmationHandle {
    pub fn new(signature: TxSignature) -> Self {
        Self { signature }
    }

    pub fn signature(&self) -> TxSignature {
        self.signature
    }
}

fn local_rejection(e: TransactionError) -> LedgerError {
    LedgerError::Rejected(e.to_string())
}

#[derive(Clone)]
pub struct LedgerClient {
    ledger: Arc<dyn Ledger>,
    config: LedgerConfig,
}

impl LedgerClient {
    pub fn new(ledger: Arc<dyn Ledger>, config: LedgerConfig) -> Self {
        Self { ledger, config }
    }

    /// Client over JSON-RPC at `config.rpc_url`.
    pub fn connect_rpc(config: LedgerConfig) -> Result<Self, LedgerError> {
        let ledger = RpcLedger::new(&config)?;
        Ok(Self::new(Arc::new(ledger), config))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub async fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError> {
        let lamports = self.ledger.get_balance(address, self.config.commitment).await?;
        debug!(address = %address.short(), lamports, "Balance fetched");
        Ok(lamports)
    }

    /// Ask the faucet to credit `address`. The credit is only trusted after
    /// [`confirm`](Self::confirm) succeeds on the returned handle.
    pub async fn request_faucet_credit(
        &self,
        address: &Pubkey,
        lamports: u64,
    ) -> Result<ConfirmationHandle, LedgerError> {
        let signature = self
            .ledger
            .request_airdrop(address, lamports, self.config.commitment)
            .await?;
        info!(address = %address.short(), lamports, %signature, "Faucet credit requested");
        Ok(ConfirmationHandle::new(signature))
    }

    /// Wait until the handle reaches the configured commitment.
    ///
    /// An errored transaction fails with [`LedgerError::Rejected`]; running
    /// out of time fails with [`LedgerError::ConfirmationTimeout`].
    pub async fn confirm(&self, handle: &ConfirmationHandle) -> Result<(), LedgerError> {
        let started = Instant::now();
        let deadline = self.config.confirm_timeout;
        match tokio::time::timeout(deadline, self.poll_until_confirmed(handle.signature)).await {
            Ok(result) => {
                if result.is_ok() {
                    debug!(
                        signature = %handle.signature,
                        elapsed_ms = duration_ms(started.elapsed()),
                        "Confirmed"
                    );
                }
                result
            }
            Err(_) => {
                warn!(signature = %handle.signature, timeout_ms = duration_ms(deadline), "Confirmation timed out");
                Err(LedgerError::ConfirmationTimeout {
                    signature: handle.signature.encode(),
                    waited_ms: duration_ms(deadline),
                })
            }
        }
    }

    async fn poll_until_confirmed(&self, signature: TxSignature) -> Result<(), LedgerError> {
        let target = self.config.commitment;
        loop {
            match self.ledger.signature_status(&signature).await {
                Ok(Some(status)) => {
                    if let Some(err) = status.err {
                        return Err(LedgerError::Rejected(err));
                    }
                    if status.satisfies(target) {
                        return Ok(());
                    }
                }
                Ok(None) => {}
                // Status polls are retried until the deadline.
                Err(e) => debug!(%signature, error = %e, "Status poll failed"),
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Build, sign, send and confirm a System-program transfer.
    ///
    /// Returns the confirmed signature.
    pub async fn submit_transfer(
        &self,
        sender: &KeyPair,
        receiver: &Pubkey,
        lamports: u64,
    ) -> Result<TxSignature, LedgerError> {
        if lamports == 0 {
            return Err(local_rejection(TransactionError::ZeroAmount));
        }
        let from = sender.pubkey();
        if from == *receiver {
            return Err(local_rejection(TransactionError::SelfTransfer));
        }

        let blockhash = self.ledger.latest_blockhash(self.config.commitment).await?;
        let signed = TransferMessage::new(from, *receiver, lamports, blockhash)
            .and_then(|message| message.sign(sender))
            .map_err(local_rejection)?;

        let signature = self
            .ledger
            .send_transaction(&signed, self.config.commitment)
            .await?;
        info!(from = %from.short(), to = %receiver.short(), lamports, %signature, "Transfer sent");

        self.confirm(&ConfirmationHandle::new(signature)).await?;
        info!(%signature, "Transfer confirmed");
        Ok(signature)
    }
}

/// Whole milliseconds, saturating instead of truncating.
fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
