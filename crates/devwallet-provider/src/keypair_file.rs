//! Provider backed by a Solana CLI keypair file (`~/.config/solana/id.json`).
//!
//! Detection and `is_supported` only check that the file parses into a
//! consistent keypair; the parsed secret is dropped straight away.
//! The secret is loaded into memory on `connect`, after the user approved,
//! and dropped again on `disconnect`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use devwallet_core::crypto::parse_keypair_json;
use devwallet_core::{KeyPair, ProviderError, Pubkey, TxSignature};

use crate::approval::{Approval, ApprovalRequest};
use crate::provider::{EVENT_CHANNEL_CAPACITY, ProviderEvent, WalletProvider};

const PROVIDER_NAME: &str = "keypair-file";

/// Default location used by the Solana CLI.
pub fn default_keypair_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("solana").join("id.json"))
}

fn load(path: &Path) -> Result<KeyPair, ProviderError> {
    let body = Zeroizing::new(
        std::fs::read_to_string(path)
            .map_err(|e| ProviderError::Provider(format!("read {}: {e}", path.display())))?,
    );
    parse_keypair_json(&body)
        .map_err(|e| ProviderError::Provider(format!("parse {}: {e}", path.display())))
}

pub struct KeypairFileProvider {
    path: PathBuf,
    account: Pubkey,
    approval: Arc<dyn Approval>,
    session: Mutex<Option<KeyPair>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl KeypairFileProvider {
    /// Probe `path`. Returns `None` if the file is missing or malformed.
    pub fn discover(path: impl Into<PathBuf>, approval: Arc<dyn Approval>) -> Option<Self> {
        let path = path.into();
        let account = match load(&path) {
            Ok(keypair) => keypair.pubkey(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No usable keypair file");
                return None;
            }
        };
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Some(Self {
            path,
            account,
            approval,
            session: Mutex::new(None),
            events,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Account found at discovery time.
    pub fn account(&self) -> Pubkey {
        self.account
    }
}

impl std::fmt::Debug for KeypairFileProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypairFileProvider")
            .field("path", &self.path)
            .field("account", &self.account)
            .field("connected", &self.session.lock().is_some())
            .finish()
    }
}

#[async_trait]
impl WalletProvider for KeypairFileProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn is_supported(&self) -> bool {
        load(&self.path).is_ok()
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.session.lock().as_ref().map(KeyPair::pubkey)
    }

    async fn connect(&self) -> Result<Pubkey, ProviderError> {
        if let Some(pubkey) = self.public_key() {
            return Ok(pubkey);
        }

        let request = ApprovalRequest {
            provider: PROVIDER_NAME.to_string(),
            account: self.account,
        };
        if !self.approval.approve(&request).await {
            info!(account = %self.account.short(), "Connection rejected");
            return Err(ProviderError::UserRejected);
        }

        let path = self.path.clone();
        let keypair = tokio::task::spawn_blocking(move || load(&path))
            .await
            .map_err(|e| ProviderError::Provider(format!("keypair load task: {e}")))??;
        let pubkey = keypair.pubkey();
        if pubkey != self.account {
            warn!(discovered = %self.account, loaded = %pubkey, "Keypair file changed since discovery");
        }

        *self.session.lock() = Some(keypair);
        let _ = self.events.send(ProviderEvent::Connected(pubkey));
        Ok(pubkey)
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        let dropped = self.session.lock().take();
        if dropped.is_some() {
            let _ = self.events.send(ProviderEvent::Disconnected);
        }
        Ok(())
    }

    async fn sign_message(&self, message: &[u8]) -> Result<TxSignature, ProviderError> {
        self.session
            .lock()
            .as_ref()
            .map(|keypair| keypair.sign(message))
            .ok_or_else(|| ProviderError::Provider("not connected".into()))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::FixedApproval;
    use devwallet_core::crypto::{keypair_to_json, verify};

    fn write_keypair(dir: &tempfile::TempDir, keypair: &KeyPair) -> PathBuf {
        let path = dir.path().join("id.json");
        std::fs::write(&path, keypair_to_json(keypair)).unwrap();
        path
    }

    fn provider(approve: bool) -> (tempfile::TempDir, KeyPair, KeypairFileProvider) {
        let dir = tempfile::tempdir().unwrap();
        let keypair = KeyPair::from_secret_bytes([3u8; 32]);
        let path = write_keypair(&dir, &keypair);
        let approval: Arc<dyn Approval> = if approve {
            Arc::new(FixedApproval::allow())
        } else {
            Arc::new(FixedApproval::deny())
        };
        let provider = KeypairFileProvider::discover(path, approval).unwrap();
        (dir, keypair, provider)
    }

    #[test]
    fn discover_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let found = KeypairFileProvider::discover(
            dir.path().join("nope.json"),
            Arc::new(FixedApproval::allow()),
        );
        assert!(found.is_none());
    }

    #[test]
    fn discover_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(KeypairFileProvider::discover(path, Arc::new(FixedApproval::allow())).is_none());
    }

    #[test]
    fn discover_does_not_connect() {
        let (_dir, keypair, provider) = provider(true);
        assert!(provider.is_supported());
        assert_eq!(provider.account(), keypair.pubkey());
        assert_eq!(provider.public_key(), None);
    }

    #[test]
    fn corrupted_file_is_unsupported() {
        let (dir, _, provider) = provider(true);
        std::fs::write(dir.path().join("id.json"), "not a keypair").unwrap();
        assert!(!provider.is_supported());
    }

    #[tokio::test]
    async fn connect_after_approval() {
        let (_dir, keypair, provider) = provider(true);
        let mut events = provider.subscribe();
        assert_eq!(provider.connect().await.unwrap(), keypair.pubkey());
        assert_eq!(provider.public_key(), Some(keypair.pubkey()));
        assert_eq!(
            events.recv().await.unwrap(),
            ProviderEvent::Connected(keypair.pubkey())
        );
    }

    #[tokio::test]
    async fn connect_rejected() {
        let (_dir, _, provider) = provider(false);
        assert_eq!(provider.connect().await, Err(ProviderError::UserRejected));
        assert_eq!(provider.public_key(), None);
    }

    #[tokio::test]
    async fn connect_fails_when_file_removed() {
        let (dir, _, provider) = provider(true);
        std::fs::remove_file(dir.path().join("id.json")).unwrap();
        assert!(!provider.is_supported());
        assert!(matches!(
            provider.connect().await,
            Err(ProviderError::Provider(_))
        ));
    }

    #[tokio::test]
    async fn sign_requires_connection() {
        let (_dir, keypair, provider) = provider(true);
        assert!(provider.sign_message(b"hello").await.is_err());
        provider.connect().await.unwrap();
        let sig = provider.sign_message(b"hello").await.unwrap();
        assert!(verify(&keypair.pubkey(), b"hello", &sig).is_ok());
    }

    #[tokio::test]
    async fn disconnect_twice() {
        let (_dir, _, provider) = provider(true);
        provider.connect().await.unwrap();
        let mut events = provider.subscribe();
        provider.disconnect().await.unwrap();
        provider.disconnect().await.unwrap();
        assert_eq!(provider.public_key(), None);
        assert_eq!(events.recv().await.unwrap(), ProviderEvent::Disconnected);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn debug_hides_secret() {
        let (_dir, keypair, provider) = provider(true);
        let out = format!("{provider:?}");
        assert!(out.contains(&keypair.pubkey().encode()));
        assert!(!out.contains(&keypair_to_json(&keypair)));
    }
}
