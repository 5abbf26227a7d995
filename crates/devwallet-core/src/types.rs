//! Balance bookkeeping and display helpers.

use serde::{Deserialize, Serialize};

use crate::constants::LAMPORTS_PER_SOL;

/// Last known balance of an account, as shown to the user.
///
/// A value is only ever `Known` when it came from a successful ledger query.
/// While a refresh is in flight the previous value is hidden behind
/// `Loading`. A failed refresh restores the last `Known` value; `Unavailable`
/// means no query has succeeded yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "lamports", rename_all = "snake_case")]
pub enum Balance {
    #[default]
    Loading,
    Known(u64),
    Unavailable,
}

impl Balance {
    /// Lamports if the balance is settled.
    pub fn known(&self) -> Option<u64> {
        match self {
            Self::Known(lamports) => Some(*lamports),
            _ => None,
        }
    }

    /// What to show after a failed refresh, given the value before it.
    pub fn retained(self) -> Self {
        match self {
            Self::Known(lamports) => Self::Known(lamports),
            Self::Loading | Self::Unavailable => Self::Unavailable,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Human-readable form: `5.00 SOL`, `Loading...` or `Unavailable`.
    pub fn display(&self) -> String {
        match self {
            Self::Known(lamports) => format_sol(*lamports),
            Self::Loading => "Loading...".to_string(),
            Self::Unavailable => "Unavailable".to_string(),
        }
    }
}

/// Lamports in SOL (display helper, not for arithmetic).
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Format lamports as SOL with two decimals, e.g. `5.00 SOL`.
///
/// # Examples
///
/// ```
/// use devwallet_core::types::format_sol;
/// assert_eq!(format_sol(5_000_000_000), "5.00 SOL");
/// assert_eq!(format_sol(100_000_000), "0.10 SOL");
/// ```
pub fn format_sol(lamports: u64) -> String {
    format!("{:.2} SOL", lamports_to_sol(lamports))
}
