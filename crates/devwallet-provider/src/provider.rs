//! The capability interface every wallet provider implements.

use async_trait::async_trait;
use tokio::sync::broadcast;

use devwallet_core::{ProviderError, Pubkey, SignedTransaction, TransferMessage, TxSignature};

/// Capacity of each provider's event channel. Events are tiny and the
/// session drains them continuously.
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Notifications a provider raises on its own initiative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The provider granted a connection for this account.
    Connected(Pubkey),
    /// The provider dropped the connection.
    Disconnected,
    /// The user switched accounts inside the provider. `None` means the
    /// provider has no account to offer until the user reconnects.
    AccountChanged(Option<Pubkey>),
}

/// A wallet living outside the session that can approve connections and
/// sign on the user's behalf.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Display name (e.g. "keypair-file").
    fn name(&self) -> &str;

    /// Whether this provider recognises its host environment and can serve
    /// requests. Must not have side effects.
    fn is_supported(&self) -> bool;

    /// Account currently connected, if any.
    fn public_key(&self) -> Option<Pubkey>;

    /// Ask the user to approve a connection. Suspends until they answer.
    async fn connect(&self) -> Result<Pubkey, ProviderError>;

    /// Release the connection. Succeeds when already disconnected.
    async fn disconnect(&self) -> Result<(), ProviderError>;

    /// Sign arbitrary bytes with the connected account.
    async fn sign_message(&self, message: &[u8]) -> Result<TxSignature, ProviderError>;

    /// Sign a transfer whose fee payer is the connected account.
    async fn sign_transaction(
        &self,
        message: &TransferMessage,
    ) -> Result<SignedTransaction, ProviderError> {
        if self.public_key() != Some(message.from) {
            return Err(ProviderError::Provider(
                "transaction is not paid by the connected account".into(),
            ));
        }
        let bytes = message.serialize();
        let signature = self.sign_message(&bytes).await?;
        Ok(SignedTransaction::from_parts(bytes, signature))
    }

    /// Subscribe to connection events.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}
