//! Provider detection and the gateway the session talks to.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};

use devwallet_core::{ProviderError, Pubkey, SignedTransaction, TransferMessage, TxSignature};

use crate::provider::{ProviderEvent, WalletProvider};

/// Shared handle to a detected provider.
#[derive(Clone)]
pub struct ProviderHandle {
    inner: Arc<dyn WalletProvider>,
}

impl ProviderHandle {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self { inner: provider }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.inner
    }
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("name", &self.inner.name())
            .finish()
    }
}

/// Return the first candidate that reports itself as supported.
///
/// Only `is_supported` is consulted, so detection never prompts the user.
pub fn detect<I>(candidates: I) -> Option<ProviderHandle>
where
    I: IntoIterator<Item = Arc<dyn WalletProvider>>,
{
    for candidate in candidates {
        if candidate.is_supported() {
            info!(provider = candidate.name(), "Wallet provider detected");
            return Some(ProviderHandle::new(candidate));
        }
        debug!(provider = candidate.name(), "Wallet provider not supported here");
    }
    None
}

/// Façade over an optional provider.
///
/// Holds no session state: every call hands its result back to the caller.
#[derive(Clone, Debug, Default)]
pub struct ProviderGateway {
    handle: Option<ProviderHandle>,
}

impl ProviderGateway {
    pub fn new(handle: Option<ProviderHandle>) -> Self {
        Self { handle }
    }

    /// Detect among `candidates` and wrap the result.
    pub fn detect<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn WalletProvider>>,
    {
        Self::new(detect(candidates))
    }

    pub fn is_available(&self) -> bool {
        self.handle.is_some()
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.handle.as_ref().map(|h| h.name())
    }

    fn provider(&self) -> Result<&Arc<dyn WalletProvider>, ProviderError> {
        self.handle
            .as_ref()
            .map(|h| h.provider())
            .ok_or(ProviderError::Unavailable)
    }

    /// Run the provider's approval flow.
    pub async fn connect(&self) -> Result<Pubkey, ProviderError> {
        let provider = self.provider()?;
        debug!(provider = provider.name(), "Requesting wallet connection");
        let pubkey = provider.connect().await?;
        info!(provider = provider.name(), account = %pubkey, "Wallet connected");
        Ok(pubkey)
    }

    /// Release the connection. With no provider there is nothing to release.
    pub async fn disconnect(&self) -> Result<(), ProviderError> {
        let Some(handle) = &self.handle else {
            return Ok(());
        };
        handle.provider().disconnect().await?;
        info!(provider = handle.name(), "Wallet disconnected");
        Ok(())
    }

    pub fn public_key(&self) -> Option<Pubkey> {
        self.handle.as_ref().and_then(|h| h.provider().public_key())
    }

    pub async fn sign_message(&self, message: &[u8]) -> Result<TxSignature, ProviderError> {
        self.provider()?.sign_message(message).await
    }

    pub async fn sign_transaction(
        &self,
        message: &TransferMessage,
    ) -> Result<SignedTransaction, ProviderError> {
        self.provider()?.sign_transaction(message).await
    }

    /// Event subscription, or `None` when no provider was detected.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        self.handle.as_ref().map(|h| h.provider().subscribe())
    }
}
