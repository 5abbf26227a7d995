//! Command execution.
//!
//! The controller is the only writer of session state. Every command checks
//! its precondition first, leaves state untouched if a collaborator fails,
//! and publishes a fresh [`SessionSnapshot`] whenever something visible
//! changes (including `Loading` balances while a query is in flight).
//!
//! Balance queries that follow a successful operation are best effort: the
//! operation stands even if the query fails, the balance keeps its last
//! queried value (or `Unavailable` if there never was one) and a notice
//! explains why.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use devwallet_core::{Balance, LedgerError, Pubkey};
use devwallet_ledger::LedgerClient;
use devwallet_provider::{ProviderEvent, ProviderGateway};
use devwallet_wallet::{EphemeralWallet, WalletStage};

use crate::busy::BusySet;
use crate::command::Command;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::snapshot::{
    AccountView, Notice, Panel, ProviderInfo, SessionSnapshot, TransferRecord, WalletView,
};

#[derive(Debug, Clone, Copy)]
struct ConnectedAccount {
    address: Pubkey,
    balance: Balance,
}

pub struct SessionController {
    gateway: ProviderGateway,
    ledger: LedgerClient,
    config: SessionConfig,
    account: Option<ConnectedAccount>,
    wallet: Option<EphemeralWallet>,
    last_transfer: Option<TransferRecord>,
    notice: Option<Notice>,
    busy: Arc<BusySet>,
    version: u64,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    pub fn new(gateway: ProviderGateway, ledger: LedgerClient, config: SessionConfig) -> Self {
        let initial = SessionSnapshot {
            version: 0,
            network: config.network.clone(),
            provider: ProviderInfo {
                available: false,
                name: None,
            },
            account: None,
            wallet: None,
            last_transfer: None,
            last_transfer_display: None,
            notice: None,
            busy: Vec::new(),
            panel: Panel::NoWallet,
        };
        let (snapshots, _) = watch::channel(initial);
        let mut controller = Self {
            gateway,
            ledger,
            config,
            account: None,
            wallet: None,
            last_transfer: None,
            notice: None,
            busy: Arc::new(BusySet::default()),
            version: 0,
            snapshots,
        };
        controller.publish();
        controller
    }

    // -- Accessors ---------------------------------------------------------

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn account_address(&self) -> Option<Pubkey> {
        self.account.map(|a| a.address)
    }

    pub fn wallet(&self) -> Option<&EphemeralWallet> {
        self.wallet.as_ref()
    }

    pub fn last_transfer(&self) -> Option<&TransferRecord> {
        self.last_transfer.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub(crate) fn busy_set(&self) -> Arc<BusySet> {
        Arc::clone(&self.busy)
    }

    pub(crate) fn provider_events(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        self.gateway.subscribe()
    }

    // -- Publishing --------------------------------------------------------

    fn build_snapshot(&self) -> SessionSnapshot {
        let account = self
            .account
            .map(|a| AccountView::new(a.address, a.balance));
        let wallet = self.wallet.as_ref().map(WalletView::from);
        let panel = Panel::derive(account.as_ref(), wallet.as_ref());
        SessionSnapshot {
            version: self.version,
            network: self.config.network.clone(),
            provider: ProviderInfo {
                available: self.gateway.is_available(),
                name: self.gateway.provider_name().map(str::to_string),
            },
            account,
            wallet,
            last_transfer_display: self.last_transfer.as_ref().map(SessionSnapshot::transfer_summary),
            last_transfer: self.last_transfer.clone(),
            notice: self.notice.clone(),
            busy: self.busy.snapshot(),
            panel,
        }
    }

    /// Publish the current state to every snapshot subscriber.
    pub fn publish(&mut self) {
        self.version += 1;
        let snapshot = self.build_snapshot();
        self.snapshots.send_replace(snapshot);
    }

    // -- Command boundary --------------------------------------------------

    /// Run one command to completion. Failures become the session notice.
    pub async fn execute(&mut self, command: Command) -> Result<(), SessionError> {
        let name = command.name();
        debug!(command = name, "Executing command");
        self.notice = None;
        self.publish();

        let result = match command {
            Command::ConnectWallet => self.connect_wallet().await,
            Command::DisconnectWallet => self.disconnect_wallet().await,
            Command::CreateWallet => self.create_wallet(),
            Command::AirdropTokens => self.airdrop_tokens().await,
            Command::TransferTokens { amount_lamports } => self.transfer_tokens(amount_lamports).await,
            Command::RefreshBalances => self.refresh_balances().await,
            Command::DismissNotice => Ok(()),
        };

        match &result {
            Ok(()) => info!(command = name, "Command completed"),
            Err(e) => {
                warn!(command = name, kind = ?e.kind(), error = %e, "Command failed");
                self.notice = Some(Notice::from(e));
            }
        }
        self.publish();
        result
    }

    // -- Balances ----------------------------------------------------------

    fn set_account_balance(&mut self, balance: Balance) {
        if let Some(account) = self.account.as_mut() {
            account.balance = balance;
        }
    }

    fn set_wallet_balance(&mut self, balance: Balance) {
        if let Some(wallet) = self.wallet.as_mut() {
            wallet.set_balance(balance);
        }
    }

    /// Query the connected account's balance. `Ok(None)` without an account.
    async fn refresh_account_balance(&mut self) -> Result<Option<u64>, LedgerError> {
        let Some(address) = self.account_address() else {
            return Ok(None);
        };
        let previous = self.account.as_ref().map_or(Balance::Loading, |a| a.balance);
        self.set_account_balance(Balance::Loading);
        self.publish();
        match self.ledger.get_balance(&address).await {
            Ok(lamports) => {
                self.set_account_balance(Balance::Known(lamports));
                Ok(Some(lamports))
            }
            Err(e) => {
                self.set_account_balance(previous.retained());
                Err(e)
            }
        }
    }

    /// Query the ephemeral wallet's balance. `Ok(None)` without a wallet.
    async fn refresh_wallet_balance(&mut self) -> Result<Option<u64>, LedgerError> {
        let Some(address) = self.wallet.as_ref().map(EphemeralWallet::address) else {
            return Ok(None);
        };
        let previous = self.wallet.as_ref().map_or(Balance::Loading, EphemeralWallet::balance);
        self.set_wallet_balance(Balance::Loading);
        self.publish();
        match self.ledger.get_balance(&address).await {
            Ok(lamports) => {
                self.set_wallet_balance(Balance::Known(lamports));
                Ok(Some(lamports))
            }
            Err(e) => {
                self.set_wallet_balance(previous.retained());
                Err(e)
            }
        }
    }

    /// Follow-up query after a successful operation: a failure only leaves
    /// a notice.
    fn staged(&mut self, what: &str, result: Result<Option<u64>, LedgerError>) -> Option<u64> {
        match result {
            Ok(lamports) => lamports,
            Err(e) => {
                warn!(what, error = %e, "Balance refresh failed");
                let err = SessionError::from(e);
                self.notice = Some(Notice {
                    kind: err.kind(),
                    message: format!("{what} balance unavailable: {err}"),
                });
                None
            }
        }
    }

    // -- Commands ----------------------------------------------------------

    async fn connect_wallet(&mut self) -> Result<(), SessionError> {
        if self.account.is_some() {
            return Err(SessionError::precondition("a wallet is already connected"));
        }
        let address = self.gateway.connect().await?;
        self.account = Some(ConnectedAccount {
            address,
            balance: Balance::Loading,
        });
        let result = self.refresh_account_balance().await;
        self.staged("connected account", result);
        Ok(())
    }

    async fn disconnect_wallet(&mut self) -> Result<(), SessionError> {
        if self.account.is_none() {
            return Err(SessionError::precondition("no wallet is connected"));
        }
        self.gateway.disconnect().await?;
        self.account = None;
        Ok(())
    }

    fn create_wallet(&mut self) -> Result<(), SessionError> {
        if self.wallet.is_some() {
            return Err(SessionError::precondition("a wallet was already created in this session"));
        }
        let wallet = EphemeralWallet::generate();
        info!(address = %wallet.address(), "Wallet created");
        self.wallet = Some(wallet);
        Ok(())
    }

    async fn airdrop_tokens(&mut self) -> Result<(), SessionError> {
        let address = match &self.wallet {
            None => return Err(SessionError::precondition("create a wallet first")),
            Some(w) if w.stage() != WalletStage::Unfunded => {
                return Err(SessionError::precondition("wallet was already funded"));
            }
            Some(w) => w.address(),
        };

        let handle = self
            .ledger
            .request_faucet_credit(&address, self.config.airdrop_lamports)
            .await?;
        self.ledger.confirm(&handle).await?;

        if let Some(wallet) = self.wallet.as_mut() {
            wallet.mark_funded()?;
        }
        info!(address = %address.short(), lamports = self.config.airdrop_lamports, "Wallet funded");

        let result = self.refresh_wallet_balance().await;
        self.staged("wallet", result);
        Ok(())
    }

    async fn transfer_tokens(&mut self, requested: Option<u64>) -> Result<(), SessionError> {
        let (stage, cached) = match &self.wallet {
            None => return Err(SessionError::precondition("create a wallet first")),
            Some(w) => (w.stage(), w.balance()),
        };
        match stage {
            WalletStage::Funded => {}
            WalletStage::Unfunded => return Err(SessionError::precondition("airdrop tokens first")),
            WalletStage::Spent => {
                return Err(SessionError::precondition("wallet was already spent"));
            }
        }
        let Some(receiver) = self.account_address() else {
            return Err(SessionError::precondition("connect a wallet to receive the transfer"));
        };

        let balance = match cached.known() {
            Some(lamports) => lamports,
            None => self
                .refresh_wallet_balance()
                .await?
                .ok_or_else(|| SessionError::precondition("create a wallet first"))?,
        };
        let amount = self.config.transfer.resolve_amount(balance, requested)?;

        let signature = {
            let Some(wallet) = self.wallet.as_ref() else {
                return Err(SessionError::precondition("create a wallet first"));
            };
            self.ledger
                .submit_transfer(wallet.signer(), &receiver, amount)
                .await?
        };

        if let Some(wallet) = self.wallet.as_mut() {
            wallet.mark_spent()?;
        }
        info!(lamports = amount, %signature, "Transfer completed");

        let sender = self.refresh_wallet_balance().await;
        let sender_balance_after = self.staged("wallet", sender);
        let receiver_result = self.refresh_account_balance().await;
        let receiver_balance_after = self.staged("connected account", receiver_result);

        self.last_transfer = Some(TransferRecord {
            amount_lamports: amount,
            signature,
            sender_balance_after,
            receiver_balance_after,
            completed_at: Utc::now(),
        });
        Ok(())
    }

    async fn refresh_balances(&mut self) -> Result<(), SessionError> {
        if self.account.is_none() && self.wallet.is_none() {
            return Err(SessionError::precondition("nothing to refresh"));
        }
        let account = self.refresh_account_balance().await;
        let wallet = self.refresh_wallet_balance().await;
        account?;
        wallet?;
        Ok(())
    }

    // -- Provider events ---------------------------------------------------

    /// Apply a change initiated inside the provider.
    pub async fn handle_event(&mut self, event: ProviderEvent) {
        let current = self.account_address();
        match event {
            ProviderEvent::Disconnected | ProviderEvent::AccountChanged(None) => {
                if current.is_some() {
                    info!(?event, "Provider dropped the account");
                    self.account = None;
                    self.publish();
                }
            }
            ProviderEvent::Connected(address) | ProviderEvent::AccountChanged(Some(address)) => {
                if current == Some(address) {
                    return;
                }
                info!(account = %address, "Provider switched account");
                self.account = Some(ConnectedAccount {
                    address,
                    balance: Balance::Loading,
                });
                let result = self.refresh_account_balance().await;
                self.staged("connected account", result);
                self.publish();
            }
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("account", &self.account)
            .field("wallet", &self.wallet)
            .field("last_transfer", &self.last_transfer)
            .field("notice", &self.notice)
            .finish_non_exhaustive()
    }
}
