//! # devwallet-ledger: everything that talks to the ledger.
//!
//! [`LedgerClient`] is what the session uses. It sits on a [`Ledger`]
//! transport, which is either [`RpcLedger`] (Solana JSON-RPC over HTTP) or,
//! with the `testing` feature, an in-memory `MemoryLedger`.
//!
//! Responses are re-typed at the transport boundary; nothing above
//! [`rpc`] ever sees a `serde_json::Value`.

pub mod client;
pub mod config;
pub mod rpc;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use client::{ConfirmationHandle, LedgerClient};
pub use config::LedgerConfig;
pub use rpc::RpcLedger;
pub use transport::{Ledger, SignatureStatus};

#[cfg(any(test, feature = "testing"))]
pub use memory::{LedgerOp, MemoryLedger};
