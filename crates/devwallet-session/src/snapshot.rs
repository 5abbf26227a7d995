//! Published session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use devwallet_core::{format_sol, Balance, Pubkey, TxSignature};
use devwallet_wallet::{EphemeralWallet, WalletStage};

use crate::command::Entity;
use crate::error::{ErrorKind, SessionError};

/// A completed transfer from the ephemeral wallet to the connected account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub amount_lamports: u64,
    pub signature: TxSignature,
    /// `None` if the balance query after the transfer failed.
    pub sender_balance_after: Option<u64>,
    pub receiver_balance_after: Option<u64>,
    pub completed_at: DateTime<Utc>,
}

/// The last failure, until dismissed or replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&SessionError> for Notice {
    fn from(err: &SessionError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub available: bool,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub address: Pubkey,
    pub balance: Balance,
    pub balance_display: String,
}

impl AccountView {
    pub fn new(address: Pubkey, balance: Balance) -> Self {
        Self {
            address,
            balance,
            balance_display: balance.display(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletView {
    pub address: Pubkey,
    pub balance: Balance,
    pub balance_display: String,
    pub stage: WalletStage,
    pub funded: bool,
    pub spent: bool,
}

impl From<&EphemeralWallet> for WalletView {
    fn from(wallet: &EphemeralWallet) -> Self {
        Self {
            address: wallet.address(),
            balance: wallet.balance(),
            balance_display: wallet.balance().display(),
            stage: wallet.stage(),
            funded: wallet.is_funded(),
            spent: wallet.is_spent(),
        }
    }
}

/// Which of the five screens the user should see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    NoWallet,
    Connected,
    WalletCreated,
    Funded,
    Transferred,
}

impl Panel {
    /// Furthest step reached wins.
    pub fn derive(account: Option<&AccountView>, wallet: Option<&WalletView>) -> Self {
        match (account, wallet) {
            (_, Some(w)) if w.spent => Self::Transferred,
            (_, Some(w)) if w.funded => Self::Funded,
            (_, Some(_)) => Self::WalletCreated,
            (Some(_), None) => Self::Connected,
            (None, None) => Self::NoWallet,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Bumped on every publish.
    pub version: u64,
    pub network: String,
    pub provider: ProviderInfo,
    pub account: Option<AccountView>,
    pub wallet: Option<WalletView>,
    pub last_transfer: Option<TransferRecord>,
    pub last_transfer_display: Option<String>,
    pub notice: Option<Notice>,
    pub busy: Vec<Entity>,
    pub panel: Panel,
}

impl SessionSnapshot {
    pub fn is_busy(&self, entity: Entity) -> bool {
        self.busy.contains(&entity)
    }

    pub fn transfer_summary(record: &TransferRecord) -> String {
        format!("Sent {} ({})", format_sol(record.amount_lamports), record.signature)
    }
}
