//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use devwallet_core::constants::{
    DEFAULT_AIRDROP_LAMPORTS, DEFAULT_CONFIRM_TIMEOUT_SECS, DEFAULT_LAMPORTS_PER_SIGNATURE,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_RESERVE_LAMPORTS, DEFAULT_RPC_TIMEOUT_SECS,
};
use devwallet_core::{Cluster, Commitment};
use devwallet_ledger::LedgerConfig;
use devwallet_provider::default_keypair_path;
use devwallet_session::{FeePolicy, SessionConfig, TransferPolicy};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FeePolicyArg {
    /// Leave the network fee to the reserve.
    Ignore,
    /// Take the network fee out of the transfer amount.
    Account,
}

impl From<FeePolicyArg> for FeePolicy {
    fn from(arg: FeePolicyArg) -> Self {
        match arg {
            FeePolicyArg::Ignore => FeePolicy::Ignore,
            FeePolicyArg::Account => FeePolicy::Account,
        }
    }
}

/// Connect a wallet, mint a throwaway keypair, fund it and send it home.
#[derive(Parser, Debug, Clone)]
#[command(name = "devwallet-web", version, about)]
pub struct Args {
    /// Cluster to talk to (devnet, testnet, localnet, mainnet-beta).
    #[arg(long, env = "DEVWALLET_CLUSTER", default_value = "devnet")]
    pub cluster: Cluster,

    /// Custom JSON-RPC endpoint; overrides the cluster default.
    #[arg(long, env = "DEVWALLET_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Commitment required before a result is trusted.
    #[arg(long, env = "DEVWALLET_COMMITMENT", default_value = "confirmed")]
    pub commitment: Commitment,

    /// Keypair file used as the wallet provider
    /// (default: ~/.config/solana/id.json).
    #[arg(long, env = "DEVWALLET_KEYPAIR")]
    pub keypair: Option<PathBuf>,

    /// Approve connection requests without prompting on the terminal.
    #[arg(long, env = "DEVWALLET_AUTO_APPROVE")]
    pub auto_approve: bool,

    /// Address for the HTTP server.
    #[arg(long, env = "DEVWALLET_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Lamports requested from the faucet.
    #[arg(long, env = "DEVWALLET_AIRDROP_LAMPORTS", default_value_t = DEFAULT_AIRDROP_LAMPORTS)]
    pub airdrop_lamports: u64,

    /// Lamports kept back in the throwaway wallet on transfer.
    #[arg(long, env = "DEVWALLET_RESERVE_LAMPORTS", default_value_t = DEFAULT_RESERVE_LAMPORTS)]
    pub reserve_lamports: u64,

    #[arg(long, env = "DEVWALLET_FEE_POLICY", value_enum, default_value_t = FeePolicyArg::Ignore)]
    pub fee_policy: FeePolicyArg,

    #[arg(long, env = "DEVWALLET_FEE_LAMPORTS", default_value_t = DEFAULT_LAMPORTS_PER_SIGNATURE)]
    pub fee_lamports: u64,

    #[arg(long, env = "DEVWALLET_RPC_TIMEOUT_SECS", default_value_t = DEFAULT_RPC_TIMEOUT_SECS)]
    pub rpc_timeout_secs: u64,

    #[arg(long, env = "DEVWALLET_CONFIRM_TIMEOUT_SECS", default_value_t = DEFAULT_CONFIRM_TIMEOUT_SECS)]
    pub confirm_timeout_secs: u64,

    #[arg(long, env = "DEVWALLET_POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    /// Emit logs as JSON lines.
    #[arg(long, env = "DEVWALLET_LOG_JSON")]
    pub log_json: bool,
}

impl Args {
    pub fn rpc_url(&self) -> String {
        self.rpc_url
            .clone()
            .unwrap_or_else(|| self.cluster.rpc_url().to_string())
    }

    pub fn keypair_path(&self) -> Option<PathBuf> {
        self.keypair.clone().or_else(default_keypair_path)
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            rpc_url: self.rpc_url(),
            commitment: self.commitment,
            request_timeout: Duration::from_secs(self.rpc_timeout_secs),
            confirm_timeout: Duration::from_secs(self.confirm_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            airdrop_lamports: self.airdrop_lamports,
            transfer: TransferPolicy {
                reserve_lamports: self.reserve_lamports,
                fee: self.fee_policy.into(),
                fee_lamports: self.fee_lamports,
            },
            network: self.cluster.name().to_string(),
        }
    }
}
