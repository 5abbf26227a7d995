//! # devwallet-session: the wallet session state machine.
//!
//! A [`SessionController`] owns everything the user sees: the connected
//! account, the ephemeral wallet, the last transfer and the last error. It
//! is driven by [`Command`]s, one at a time, from a single runner task
//! started with [`spawn_session`]. Callers hold a cloneable
//! [`SessionHandle`] and read state through [`SessionSnapshot`]s published
//! on a watch channel.
//!
//! # Modules
//!
//! - [`command`]: commands and the entities they touch
//! - [`config`]: session and transfer policy settings
//! - [`controller`]: command execution and provider event handling
//! - [`error`]: `SessionError` and the flattened `ErrorKind`
//! - [`runner`]: the command queue, busy tracking and handle
//! - [`snapshot`]: published state and panel derivation

pub mod busy;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod runner;
pub mod snapshot;

pub use command::{Command, Entity};
pub use config::{FeePolicy, SessionConfig, TransferPolicy};
pub use controller::SessionController;
pub use error::{ErrorKind, SessionError};
pub use runner::{spawn_session, SessionHandle};
pub use snapshot::{AccountView, Notice, Panel, SessionSnapshot, TransferRecord, WalletView};
