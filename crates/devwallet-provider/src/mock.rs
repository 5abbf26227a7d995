//! Scripted provider for tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use devwallet_core::{KeyPair, ProviderError, Pubkey, TxSignature};

use crate::provider::{EVENT_CHANNEL_CAPACITY, ProviderEvent, WalletProvider};

/// Provider whose answers are queued up front.
///
/// `connect` pops the next scripted outcome; with nothing queued it approves
/// with the key passed to [`MockProvider::new`].
pub struct MockProvider {
    keypair: KeyPair,
    supported: Mutex<bool>,
    connected: Mutex<Option<Pubkey>>,
    connect_script: Mutex<VecDeque<Result<Pubkey, ProviderError>>>,
    disconnect_script: Mutex<VecDeque<Result<(), ProviderError>>>,
    connect_delay: Mutex<Option<Duration>>,
    connect_calls: Mutex<usize>,
    disconnect_calls: Mutex<usize>,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockProvider {
    pub fn new(keypair: KeyPair) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            keypair,
            supported: Mutex::new(true),
            connected: Mutex::new(None),
            connect_script: Mutex::new(VecDeque::new()),
            disconnect_script: Mutex::new(VecDeque::new()),
            connect_delay: Mutex::new(None),
            connect_calls: Mutex::new(0),
            disconnect_calls: Mutex::new(0),
            events,
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn set_supported(&self, supported: bool) {
        *self.supported.lock() = supported;
    }

    pub fn push_connect(&self, outcome: Result<Pubkey, ProviderError>) {
        self.connect_script.lock().push_back(outcome);
    }

    pub fn push_disconnect(&self, outcome: Result<(), ProviderError>) {
        self.disconnect_script.lock().push_back(outcome);
    }

    /// Make every `connect` wait this long before answering.
    pub fn set_connect_delay(&self, delay: Duration) {
        *self.connect_delay.lock() = Some(delay);
    }

    pub fn connect_calls(&self) -> usize {
        *self.connect_calls.lock()
    }

    pub fn disconnect_calls(&self) -> usize {
        *self.disconnect_calls.lock()
    }

    /// Raise an event as if the user acted inside the provider.
    pub fn emit(&self, event: ProviderEvent) {
        match &event {
            ProviderEvent::Connected(pk) => *self.connected.lock() = Some(*pk),
            ProviderEvent::AccountChanged(pk) => *self.connected.lock() = *pk,
            ProviderEvent::Disconnected => *self.connected.lock() = None,
        }
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_supported(&self) -> bool {
        *self.supported.lock()
    }

    fn public_key(&self) -> Option<Pubkey> {
        *self.connected.lock()
    }

    async fn connect(&self) -> Result<Pubkey, ProviderError> {
        *self.connect_calls.lock() += 1;
        let delay = *self.connect_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = self
            .connect_script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(self.keypair.pubkey()));
        let pubkey = outcome?;
        *self.connected.lock() = Some(pubkey);
        let _ = self.events.send(ProviderEvent::Connected(pubkey));
        Ok(pubkey)
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        *self.disconnect_calls.lock() += 1;
        let scripted = self.disconnect_script.lock().pop_front();
        if let Some(outcome) = scripted {
            outcome?;
        }
        if self.connected.lock().take().is_some() {
            let _ = self.events.send(ProviderEvent::Disconnected);
        }
        Ok(())
    }

    async fn sign_message(&self, message: &[u8]) -> Result<TxSignature, ProviderError> {
        match *self.connected.lock() {
            Some(pk) if pk == self.keypair.pubkey() => Ok(self.keypair.sign(message)),
            Some(_) => Err(ProviderError::Provider("no key for connected account".into())),
            None => Err(ProviderError::Provider("not connected".into())),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
