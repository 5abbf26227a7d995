//! Network constants. All monetary values in lamports (1 SOL = 10^9 lamports).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Faucet credit requested for a freshly generated wallet (2 SOL).
pub const DEFAULT_AIRDROP_LAMPORTS: u64 = 2 * LAMPORTS_PER_SOL;

/// Balance kept back on the ephemeral wallet when sending funds home.
///
/// 1.9 SOL. The margin keeps the sender comfortably above rent exemption
/// and the signature fee; it is policy, not a protocol value.
pub const DEFAULT_RESERVE_LAMPORTS: u64 = 1_900_000_000;

/// Base fee charged per transaction signature on current clusters.
pub const DEFAULT_LAMPORTS_PER_SIGNATURE: u64 = 5_000;

/// Length of an ed25519 public key / account address.
pub const PUBKEY_LEN: usize = 32;

/// Length of an ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;

/// Length of a serialized keypair (secret || public).
pub const KEYPAIR_LEN: usize = 64;

/// The System program owns lamport transfers. Its id is 32 zero bytes
/// (base58 `11111111111111111111111111111111`).
pub const SYSTEM_PROGRAM_ID: [u8; PUBKEY_LEN] = [0u8; PUBKEY_LEN];

/// System program instruction index for `Transfer { lamports }`.
pub const SYSTEM_TRANSFER_INSTRUCTION: u32 = 2;

/// Upper bound on how long a confirmation wait may suspend, in seconds.
pub const DEFAULT_CONFIRM_TIMEOUT_SECS: u64 = 60;

/// Interval between signature status polls, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Per-request HTTP timeout for ledger RPC calls, in seconds.
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

/// Target cluster the ledger client talks to.
///
/// # Examples
///
/// ```
/// use devwallet_core::constants::Cluster;
/// let cluster: Cluster = "devnet".parse().unwrap();
/// assert_eq!(cluster, Cluster::Devnet);
/// assert_eq!(cluster.rpc_url(), "https://api.devnet.solana.com");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    /// Public development cluster with a working faucet.
    #[default]
    Devnet,
    /// Public test cluster.
    Testnet,
    /// Local test validator on the default port.
    Localnet,
    /// Production cluster. Airdrops are refused there.
    MainnetBeta,
}

impl Cluster {
    /// Default JSON-RPC endpoint for this cluster.
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Testnet => "https://api.testnet.solana.com",
            Self::Localnet => "http://127.0.0.1:8899",
            Self::MainnetBeta => "https://api.mainnet-beta.solana.com",
        }
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
            Self::Localnet => "localnet",
            Self::MainnetBeta => "mainnet-beta",
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Cluster {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            "localnet" | "localhost" => Ok(Self::Localnet),
            "mainnet" | "mainnet-beta" => Ok(Self::MainnetBeta),
            other => Err(format!("unknown cluster: {other}")),
        }
    }
}

/// Commitment level a confirmation wait must reach.
///
/// Ordered: `Processed < Confirmed < Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Commitment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(format!("unknown commitment: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_is_below_default_airdrop() {
        assert!(DEFAULT_RESERVE_LAMPORTS < DEFAULT_AIRDROP_LAMPORTS);
        assert_eq!(
            DEFAULT_AIRDROP_LAMPORTS - DEFAULT_RESERVE_LAMPORTS,
            100_000_000
        );
    }

    #[test]
    fn cluster_roundtrip_names() {
        for cluster in [
            Cluster::Devnet,
            Cluster::Testnet,
            Cluster::Localnet,
            Cluster::MainnetBeta,
        ] {
            assert_eq!(cluster.name().parse::<Cluster>().unwrap(), cluster);
        }
    }

    #[test]
    fn cluster_aliases() {
        assert_eq!("mainnet".parse::<Cluster>().unwrap(), Cluster::MainnetBeta);
        assert_eq!("LOCALHOST".parse::<Cluster>().unwrap(), Cluster::Localnet);
        assert!("moonnet".parse::<Cluster>().is_err());
    }

    #[test]
    fn cluster_default_is_devnet() {
        assert_eq!(Cluster::default(), Cluster::Devnet);
        assert_eq!(Cluster::Localnet.rpc_url(), "http://127.0.0.1:8899");
    }

    #[test]
    fn cluster_serde_kebab_case() {
        let json = serde_json::to_string(&Cluster::MainnetBeta).unwrap();
        assert_eq!(json, "\"mainnet-beta\"");
    }

    #[test]
    fn commitment_ordering() {
        assert!(Commitment::Processed < Commitment::Confirmed);
        assert!(Commitment::Confirmed < Commitment::Finalized);
        assert_eq!(Commitment::default(), Commitment::Confirmed);
    }

    #[test]
    fn commitment_parse() {
        assert_eq!("Finalized".parse::<Commitment>().unwrap(), Commitment::Finalized);
        assert!("eventually".parse::<Commitment>().is_err());
    }
}
