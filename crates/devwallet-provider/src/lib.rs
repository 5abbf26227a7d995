//! # devwallet-provider: wallet providers and the gateway in front of them.
//!
//! A provider is whatever in the host environment can hold a user's key and
//! approve requests on their behalf. The session never talks to one
//! directly: it goes through [`ProviderGateway`], which turns "nothing
//! installed" into [`ProviderError::Unavailable`](devwallet_core::ProviderError)
//! and forwards provider events as a typed subscription.
//!
//! # Modules
//!
//! - [`provider`]: `WalletProvider` trait and `ProviderEvent`
//! - [`gateway`]: detection and the gateway façade
//! - [`approval`]: approval prompts (`Approval`, `FixedApproval`, `TerminalApproval`)
//! - [`keypair_file`]: provider backed by a Solana CLI keypair file
//! - `mock`: scripted provider (feature `testing`)

pub mod approval;
pub mod gateway;
pub mod keypair_file;
pub mod provider;

#[cfg(any(test, feature = "testing"))]
pub mod mock;

pub use approval::{Approval, ApprovalRequest, FixedApproval, TerminalApproval};
pub use gateway::{detect, ProviderGateway, ProviderHandle};
pub use keypair_file::{default_keypair_path, KeypairFileProvider};
pub use provider::{ProviderEvent, WalletProvider};
