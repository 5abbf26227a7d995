//! Ephemeral wallet and its funding lifecycle.
//!
//! ```text
//! Unfunded --mark_funded--> Funded --mark_spent--> Spent
//! ```
//!
//! Every other transition is refused and leaves the stage unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use devwallet_core::{Balance, KeyPair, Pubkey};

use crate::error::WalletError;

/// Where a wallet is in its one-shot lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletStage {
    Unfunded,
    Funded,
    Spent,
}

impl fmt::Display for WalletStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unfunded => "unfunded",
            Self::Funded => "funded",
            Self::Spent => "spent",
        })
    }
}

/// A keypair generated for this session only.
pub struct EphemeralWallet {
    keypair: KeyPair,
    address: Pubkey,
    balance: Balance,
    stage: WalletStage,
}

impl EphemeralWallet {
    /// Fresh keypair from the OS RNG. A new account holds nothing, so the
    /// balance starts at a known zero.
    pub fn generate() -> Self {
        Self::from_keypair(KeyPair::generate())
    }

    pub fn from_keypair(keypair: KeyPair) -> Self {
        let address = keypair.pubkey();
        debug!(address = %address.short(), "Ephemeral wallet created");
        Self {
            keypair,
            address,
            balance: Balance::Known(0),
            stage: WalletStage::Unfunded,
        }
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn stage(&self) -> WalletStage {
        self.stage
    }

    pub fn is_funded(&self) -> bool {
        matches!(self.stage, WalletStage::Funded | WalletStage::Spent)
    }

    pub fn is_spent(&self) -> bool {
        self.stage == WalletStage::Spent
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    pub fn set_balance(&mut self, balance: Balance) {
        self.balance = balance;
    }

    /// Signing key. Only the ledger client should need this.
    pub fn signer(&self) -> &KeyPair {
        &self.keypair
    }

    fn advance(&mut self, from: WalletStage, to: WalletStage) -> Result<(), WalletError> {
        if self.stage != from {
            return Err(WalletError::InvalidTransition {
                from: self.stage,
                to,
            });
        }
        debug!(address = %self.address.short(), %from, %to, "Wallet stage changed");
        self.stage = to;
        Ok(())
    }

    /// Unfunded → Funded. Call only after the faucet credit is confirmed.
    pub fn mark_funded(&mut self) -> Result<(), WalletError> {
        self.advance(WalletStage::Unfunded, WalletStage::Funded)
    }

    /// Funded → Spent. Call only after the outgoing transfer is confirmed.
    pub fn mark_spent(&mut self) -> Result<(), WalletError> {
        self.advance(WalletStage::Funded, WalletStage::Spent)
    }
}

impl fmt::Debug for EphemeralWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralWallet")
            .field("address", &self.address)
            .field("balance", &self.balance)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}
