//! Session error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use devwallet_core::{LedgerError, ProviderError};
use devwallet_wallet::WalletError;

/// Errors surfaced by session commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// Computed or requested amount exceeds what the wallet may spend.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Wallet balance in lamports.
        have: u64,
        /// Lamports required, reserve included.
        need: u64,
    },

    /// Command not allowed in the current state.
    #[error("{0}")]
    Precondition(String),
}

/// Flat classification of every session failure, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ProviderUnavailable,
    UserRejected,
    ProviderError,
    NetworkError,
    FaucetUnavailable,
    ConfirmationTimeout,
    InsufficientFunds,
    Rejected,
    PreconditionViolation,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Provider(ProviderError::Unavailable) => ErrorKind::ProviderUnavailable,
            Self::Provider(ProviderError::UserRejected) => ErrorKind::UserRejected,
            Self::Provider(ProviderError::Provider(_)) => ErrorKind::ProviderError,
            Self::Ledger(LedgerError::Network(_)) => ErrorKind::NetworkError,
            Self::Ledger(LedgerError::FaucetUnavailable(_)) => ErrorKind::FaucetUnavailable,
            Self::Ledger(LedgerError::ConfirmationTimeout { .. }) => ErrorKind::ConfirmationTimeout,
            Self::Ledger(LedgerError::InsufficientFunds(_)) | Self::InsufficientFunds { .. } => {
                ErrorKind::InsufficientFunds
            }
            Self::Ledger(LedgerError::Rejected(_)) => ErrorKind::Rejected,
            Self::Wallet(_) | Self::Precondition(_) => ErrorKind::PreconditionViolation,
        }
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }
}
