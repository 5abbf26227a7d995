//! Wallet error types.

use thiserror::Error;

use crate::wallet::WalletStage;

/// Errors that can occur in wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Requested a stage change the lifecycle does not allow.
    #[error("invalid wallet transition: {from} -> {to}")]
    InvalidTransition {
        /// Stage the wallet is in.
        from: WalletStage,
        /// Stage that was requested.
        to: WalletStage,
    },
}
