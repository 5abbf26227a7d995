//! Ledger connection settings.

use std::time::Duration;

use devwallet_core::constants::{
    DEFAULT_CONFIRM_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_RPC_TIMEOUT_SECS,
};
use devwallet_core::{Cluster, Commitment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// Commitment used for reads and required of confirmations.
    pub commitment: Commitment,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Upper bound on a confirmation wait.
    pub confirm_timeout: Duration,
    /// Delay between signature status polls.
    pub poll_interval: Duration,
}

impl LedgerConfig {
    pub fn for_cluster(cluster: Cluster) -> Self {
        Self {
            rpc_url: cluster.rpc_url().to_string(),
            ..Self::default()
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: Cluster::default().rpc_url().to_string(),
            commitment: Commitment::Confirmed,
            request_timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
            confirm_timeout: Duration::from_secs(DEFAULT_CONFIRM_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}
