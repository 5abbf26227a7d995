//! Property tests for transfer sizing and the session state machine.
//!
//! The state-machine properties replay random command sequences against a
//! live session and a tiny reference model, then check that every command
//! succeeded exactly when the model said it should and that lamports were
//! conserved.

use proptest::prelude::*;

use devwallet_session::{Command, FeePolicy, Panel, SessionError, TransferPolicy};
use devwallet_tests::helpers::*;

const AIRDROP: u64 = 2_000_000_000;
const FEE: u64 = 5_000;

fn arb_policy() -> impl Strategy<Value = TransferPolicy> {
    (
        0u64..4_000_000_000,
        prop_oneof![Just(FeePolicy::Ignore), Just(FeePolicy::Account)],
        0u64..100_000,
    )
        .prop_map(|(reserve_lamports, fee, fee_lamports)| TransferPolicy {
            reserve_lamports,
            fee,
            fee_lamports,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// A resolved amount is positive and never dips into the reserve.
    #[test]
    fn resolved_amount_respects_reserve(
        policy in arb_policy(),
        balance in 0u64..6_000_000_000,
        requested in proptest::option::of(0u64..6_000_000_000),
    ) {
        match policy.resolve_amount(balance, requested) {
            Ok(amount) => {
                prop_assert!(amount > 0);
                prop_assert!(amount <= policy.spendable(balance));
                prop_assert!(balance - amount >= policy.reserve_lamports);
                if let Some(requested) = requested {
                    prop_assert_eq!(amount, requested);
                }
            }
            Err(SessionError::InsufficientFunds { have, need }) => {
                prop_assert_eq!(have, balance);
                prop_assert!(need > balance);
            }
            Err(SessionError::Precondition(_)) => {
                prop_assert_eq!(requested, Some(0));
            }
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    /// Without an explicit amount the whole spendable balance is sent.
    #[test]
    fn default_amount_is_spendable(policy in arb_policy(), balance in 0u64..6_000_000_000) {
        let spendable = policy.spendable(balance);
        match policy.resolve_amount(balance, None) {
            Ok(amount) => prop_assert_eq!(amount, spendable),
            Err(_) => prop_assert_eq!(spendable, 0),
        }
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    None,
    Unfunded,
    Funded,
    Spent,
}

#[derive(Debug, Clone, Copy)]
struct Model {
    connected: bool,
    stage: Stage,
}

impl Model {
    /// Apply `command`; returns whether it should succeed.
    fn apply(&mut self, command: &Command) -> bool {
        match command {
            Command::ConnectWallet if !self.connected => {
                self.connected = true;
                true
            }
            Command::DisconnectWallet if self.connected => {
                self.connected = false;
                true
            }
            Command::CreateWallet if self.stage == Stage::None => {
                self.stage = Stage::Unfunded;
                true
            }
            Command::AirdropTokens if self.stage == Stage::Unfunded => {
                self.stage = Stage::Funded;
                true
            }
            Command::TransferTokens { .. } if self.stage == Stage::Funded && self.connected => {
                self.stage = Stage::Spent;
                true
            }
            Command::RefreshBalances => self.connected || self.stage != Stage::None,
            Command::DismissNotice => true,
            _ => false,
        }
    }

    fn panel(&self) -> Panel {
        match self.stage {
            Stage::Spent => Panel::Transferred,
            Stage::Funded => Panel::Funded,
            Stage::Unfunded => Panel::WalletCreated,
            Stage::None if self.connected => Panel::Connected,
            Stage::None => Panel::NoWallet,
        }
    }
}

fn arb_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::ConnectWallet),
        Just(Command::DisconnectWallet),
        Just(Command::CreateWallet),
        Just(Command::AirdropTokens),
        Just(Command::TransferTokens {
            amount_lamports: None
        }),
        Just(Command::RefreshBalances),
        Just(Command::DismissNotice),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn session_follows_model(commands in proptest::collection::vec(arb_command(), 1..16)) {
        let rt = runtime();
        rt.block_on(async {
            let fx = start();
            let mut model = Model { connected: false, stage: Stage::None };

            for command in &commands {
                let expect_ok = model.apply(command);
                let result = fx.session.execute(command.clone()).await;
                prop_assert_eq!(result.is_ok(), expect_ok, "{:?} -> {:?}", command, result);

                let snap = fx.session.snapshot();
                prop_assert_eq!(snap.panel, model.panel());
                prop_assert_eq!(snap.account.is_some(), model.connected);
                prop_assert_eq!(snap.notice.is_some(), !expect_ok);
                prop_assert!(snap.busy.is_empty());
            }

            // Lamports are conserved: everything is either with the account,
            // in the wallet, or burned as the single transfer fee.
            let snap = fx.session.snapshot();
            let wallet_balance = snap
                .wallet
                .as_ref()
                .map(|w| fx.ledger.balance_of(&w.address))
                .unwrap_or(0);
            let funded = matches!(model.stage, Stage::Funded | Stage::Spent);
            let spent = model.stage == Stage::Spent;
            let minted = if funded { AIRDROP } else { 0 };
            let burned = if spent { FEE } else { 0 };
            prop_assert_eq!(
                fx.ledger.balance_of(&fx.account()) + wallet_balance + burned,
                ACCOUNT_START + minted
            );
            if spent {
                prop_assert_eq!(wallet_balance, AIRDROP - 100_000_000 - FEE);
            }
            Ok(())
        })?;
    }
}
