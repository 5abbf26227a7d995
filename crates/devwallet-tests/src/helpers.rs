//! Shared fixtures for the integration tests.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use devwallet_core::{KeyPair, Pubkey};
use devwallet_ledger::{LedgerClient, LedgerConfig, MemoryLedger};
use devwallet_provider::mock::MockProvider;
use devwallet_provider::{ProviderGateway, WalletProvider};
use devwallet_session::{spawn_session, SessionConfig, SessionController, SessionHandle};

/// Lamports the connected account starts with.
pub const ACCOUNT_START: u64 = 5_000_000_000;

/// A running session plus the doubles behind it.
pub struct Fixture {
    pub provider: Arc<MockProvider>,
    pub ledger: Arc<MemoryLedger>,
    pub session: SessionHandle,
    pub task: JoinHandle<()>,
}

impl Fixture {
    pub fn account(&self) -> Pubkey {
        self.provider.pubkey()
    }
}

/// Ledger settings that keep confirmation fast in tests.
pub fn fast_ledger_config() -> LedgerConfig {
    LedgerConfig {
        confirm_timeout: Duration::from_secs(2),
        poll_interval: Duration::from_millis(5),
        ..LedgerConfig::default()
    }
}

/// Deterministic keypair from a seed byte.
pub fn keypair(seed: u8) -> KeyPair {
    KeyPair::from_secret_bytes([seed; 32])
}

/// Start a session with default settings and a funded account.
pub fn start() -> Fixture {
    start_with(SessionConfig::default(), fast_ledger_config())
}

pub fn start_with(config: SessionConfig, ledger_config: LedgerConfig) -> Fixture {
    let provider = Arc::new(MockProvider::new(keypair(9)));
    let ledger = Arc::new(MemoryLedger::new());
    ledger.set_balance(provider.pubkey(), ACCOUNT_START);
    let gateway = ProviderGateway::detect([provider.clone() as Arc<dyn WalletProvider>]);
    let controller = SessionController::new(
        gateway,
        LedgerClient::new(ledger.clone(), ledger_config),
        config,
    );
    let (session, task) = spawn_session(controller);
    Fixture {
        provider,
        ledger,
        session,
        task,
    }
}

/// Start a session with no wallet provider at all.
pub fn start_without_provider() -> (Arc<MemoryLedger>, SessionHandle) {
    let ledger = Arc::new(MemoryLedger::new());
    let controller = SessionController::new(
        ProviderGateway::default(),
        LedgerClient::new(ledger.clone(), fast_ledger_config()),
        SessionConfig::default(),
    );
    let (session, _task) = spawn_session(controller);
    (ledger, session)
}
