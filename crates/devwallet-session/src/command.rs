//! Session commands.

use serde::{Deserialize, Serialize};

/// Pieces of session state a command can touch. Two commands sharing an
/// entity never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Account,
    Wallet,
}

/// One user action. The JSON form is `{"command": "<snake_case name>", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    ConnectWallet,
    DisconnectWallet,
    CreateWallet,
    AirdropTokens,
    TransferTokens {
        /// Explicit amount; the policy default when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount_lamports: Option<u64>,
    },
    RefreshBalances,
    DismissNotice,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConnectWallet => "connect_wallet",
            Self::DisconnectWallet => "disconnect_wallet",
            Self::CreateWallet => "create_wallet",
            Self::AirdropTokens => "airdrop_tokens",
            Self::TransferTokens { .. } => "transfer_tokens",
            Self::RefreshBalances => "refresh_balances",
            Self::DismissNotice => "dismiss_notice",
        }
    }

    pub fn entities(&self) -> &'static [Entity] {
        match self {
            Self::ConnectWallet | Self::DisconnectWallet => &[Entity::Account],
            Self::CreateWallet | Self::AirdropTokens => &[Entity::Wallet],
            Self::TransferTokens { .. } | Self::RefreshBalances => &[Entity::Account, Entity::Wallet],
            Self::DismissNotice => &[],
        }
    }
}
