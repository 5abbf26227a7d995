//! Session settings.

use serde::{Deserialize, Serialize};

use devwallet_core::constants::{
    DEFAULT_AIRDROP_LAMPORTS, DEFAULT_LAMPORTS_PER_SIGNATURE, DEFAULT_RESERVE_LAMPORTS,
};

use crate::error::SessionError;

/// Whether the network fee is taken out of the default transfer amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeePolicy {
    /// Leave the fee to the reserve.
    #[default]
    Ignore,
    /// Subtract `fee_lamports` from what may be sent.
    Account,
}

/// How much of the ephemeral wallet a transfer may move.
///
/// `spendable = balance - reserve_lamports` (minus `fee_lamports` under
/// [`FeePolicy::Account`]). Without an explicit amount the whole spendable
/// amount is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPolicy {
    pub reserve_lamports: u64,
    pub fee: FeePolicy,
    pub fee_lamports: u64,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            reserve_lamports: DEFAULT_RESERVE_LAMPORTS,
            fee: FeePolicy::Ignore,
            fee_lamports: DEFAULT_LAMPORTS_PER_SIGNATURE,
        }
    }
}

impl TransferPolicy {
    fn withheld(&self) -> u64 {
        match self.fee {
            FeePolicy::Ignore => self.reserve_lamports,
            FeePolicy::Account => self.reserve_lamports.saturating_add(self.fee_lamports),
        }
    }

    /// Lamports that may leave a wallet holding `balance`. Zero when the
    /// reserve eats everything.
    pub fn spendable(&self, balance: u64) -> u64 {
        balance.saturating_sub(self.withheld())
    }

    /// Pick the amount to send. Pure; no network access.
    pub fn resolve_amount(&self, balance: u64, requested: Option<u64>) -> Result<u64, SessionError> {
        let spendable = self.spendable(balance);
        if spendable == 0 {
            return Err(SessionError::InsufficientFunds {
                have: balance,
                need: self.withheld().saturating_add(1),
            });
        }
        match requested {
            None => Ok(spendable),
            Some(0) => Err(SessionError::Precondition(
                "transfer amount must be greater than zero".into(),
            )),
            Some(amount) if amount > spendable => Err(SessionError::InsufficientFunds {
                have: balance,
                need: amount.saturating_add(self.withheld()),
            }),
            Some(amount) => Ok(amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Amount requested from the faucet per airdrop.
    pub airdrop_lamports: u64,
    pub transfer: TransferPolicy,
    /// Cluster label shown to the user.
    pub network: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            airdrop_lamports: DEFAULT_AIRDROP_LAMPORTS,
            transfer: TransferPolicy::default(),
            network: "devnet".to_string(),
        }
    }
}
