//! # devwallet-wallet: the throwaway wallet.
//!
//! An [`EphemeralWallet`] is generated in memory, funded once from the
//! faucet and spent once. Its key never touches disk and is zeroized when
//! the wallet is dropped.

pub mod error;
pub mod wallet;

pub use error::WalletError;
pub use wallet::{EphemeralWallet, WalletStage};
