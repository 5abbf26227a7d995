//! End-to-end session flows through the command queue.
//!
//! Each test starts a session over a scripted provider and an in-memory
//! ledger and drives it the way the web UI does: one command at a time,
//! reading the published snapshot after each.

use std::time::Duration;

use devwallet_core::{Balance, LedgerError, ProviderError};
use devwallet_ledger::LedgerOp;
use devwallet_provider::ProviderEvent;
use devwallet_session::{Command, Entity, ErrorKind, Panel, SessionConfig, SessionSnapshot};
use devwallet_tests::helpers::*;

const AIRDROP: u64 = 2_000_000_000;
const FEE: u64 = 5_000;

fn transfer() -> Command {
    Command::TransferTokens {
        amount_lamports: None,
    }
}

async fn run(fx: &Fixture, command: Command) -> SessionSnapshot {
    fx.session.execute(command).await.unwrap()
}

#[tokio::test]
async fn full_session_happy_path() {
    let fx = start();

    let snap = fx.session.snapshot();
    assert_eq!(snap.panel, Panel::NoWallet);
    assert!(snap.provider.available);
    assert_eq!(snap.provider.name.as_deref(), Some("mock"));

    let snap = run(&fx, Command::ConnectWallet).await;
    assert_eq!(snap.panel, Panel::Connected);
    let account = snap.account.unwrap();
    assert_eq!(account.address, fx.account());
    assert_eq!(account.balance, Balance::Known(ACCOUNT_START));

    let snap = run(&fx, Command::CreateWallet).await;
    assert_eq!(snap.panel, Panel::WalletCreated);
    let wallet = snap.wallet.unwrap();
    assert_eq!(wallet.balance, Balance::Known(0));
    assert!(!wallet.funded);

    let snap = run(&fx, Command::AirdropTokens).await;
    assert_eq!(snap.panel, Panel::Funded);
    let wallet = snap.wallet.unwrap();
    assert_eq!(wallet.balance, Balance::Known(AIRDROP));
    assert_eq!(wallet.balance_display, "2.00 SOL");

    let snap = run(&fx, transfer()).await;
    assert_eq!(snap.panel, Panel::Transferred);
    let record = snap.last_transfer.clone().unwrap();
    assert_eq!(record.amount_lamports, 100_000_000);
    assert_eq!(record.sender_balance_after, Some(AIRDROP - 100_000_000 - FEE));
    assert_eq!(record.receiver_balance_after, Some(ACCOUNT_START + 100_000_000));
    assert!(snap.last_transfer_display.unwrap().starts_with("Sent 0.10 SOL"));
    assert!(snap.notice.is_none());
    assert!(snap.busy.is_empty());

    assert_eq!(fx.ledger.balance_of(&fx.account()), ACCOUNT_START + 100_000_000);
    assert_eq!(fx.ledger.balance_of(&wallet.address), AIRDROP - 100_000_000 - FEE);
}

#[tokio::test]
async fn no_provider_reports_unavailable() {
    let (ledger, session) = start_without_provider();
    let err = session.execute(Command::ConnectWallet).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);

    let snap = session.snapshot();
    assert!(!snap.provider.available);
    assert!(snap.account.is_none());
    assert_eq!(snap.notice.unwrap().kind, ErrorKind::ProviderUnavailable);
    assert_eq!(ledger.total_calls(), 0);

    // The rest of the flow does not depend on a provider until transfer.
    session.execute(Command::CreateWallet).await.unwrap();
    session.execute(Command::AirdropTokens).await.unwrap();
    let err = session
        .execute(Command::TransferTokens {
            amount_lamports: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionViolation);
}

#[tokio::test]
async fn user_rejection_leaves_state_untouched() {
    let fx = start();
    fx.provider.push_connect(Err(ProviderError::UserRejected));

    let err = fx.session.execute(Command::ConnectWallet).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UserRejected);
    let snap = fx.session.snapshot();
    assert!(snap.account.is_none());
    assert_eq!(snap.panel, Panel::NoWallet);

    // Retrying works and clears the notice.
    let snap = run(&fx, Command::ConnectWallet).await;
    assert!(snap.account.is_some());
    assert!(snap.notice.is_none());
}

#[tokio::test]
async fn faucet_outage_then_retry() {
    let fx = start();
    run(&fx, Command::ConnectWallet).await;
    run(&fx, Command::CreateWallet).await;

    fx.ledger.set_faucet_enabled(false);
    let err = fx.session.execute(Command::AirdropTokens).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FaucetUnavailable);
    let snap = fx.session.snapshot();
    assert_eq!(snap.panel, Panel::WalletCreated);
    assert!(!snap.wallet.unwrap().funded);

    fx.ledger.set_faucet_enabled(true);
    let snap = run(&fx, Command::AirdropTokens).await;
    assert_eq!(snap.panel, Panel::Funded);
}

#[tokio::test]
async fn confirmation_timeout_is_distinct_from_rejection() {
    let mut ledger_config = fast_ledger_config();
    ledger_config.confirm_timeout = Duration::from_millis(50);
    let fx = start_with(SessionConfig::default(), ledger_config);
    run(&fx, Command::CreateWallet).await;

    fx.ledger.set_never_confirm(true);
    let err = fx.session.execute(Command::AirdropTokens).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfirmationTimeout);
    assert!(!fx.session.snapshot().wallet.unwrap().funded);
}

#[tokio::test]
async fn failed_execution_keeps_wallet_funded() {
    let fx = start();
    run(&fx, Command::ConnectWallet).await;
    run(&fx, Command::CreateWallet).await;
    run(&fx, Command::AirdropTokens).await;

    fx.ledger.fail_next_execution("custom program error: 0x1");
    let err = fx.session.execute(transfer()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Rejected);

    let snap = fx.session.snapshot();
    assert_eq!(snap.panel, Panel::Funded);
    assert!(snap.last_transfer.is_none());
    assert_eq!(fx.ledger.balance_of(&fx.account()), ACCOUNT_START);

    // Only the fee was charged, so a retry still clears the reserve.
    run(&fx, Command::RefreshBalances).await;
    let snap = run(&fx, transfer()).await;
    assert_eq!(snap.panel, Panel::Transferred);
    assert_eq!(snap.last_transfer.unwrap().amount_lamports, 100_000_000 - FEE);
}

#[tokio::test]
async fn post_transfer_refresh_failure_is_staged() {
    let fx = start();
    run(&fx, Command::ConnectWallet).await;
    run(&fx, Command::CreateWallet).await;
    run(&fx, Command::AirdropTokens).await;

    // First balance query after the transfer is the sender's.
    fx.ledger.fail_next(
        LedgerOp::GetBalance,
        LedgerError::Network("connection reset".into()),
    );
    let snap = run(&fx, transfer()).await;
    assert_eq!(snap.panel, Panel::Transferred);
    let record = snap.last_transfer.unwrap();
    assert_eq!(record.sender_balance_after, None);
    assert_eq!(record.receiver_balance_after, Some(ACCOUNT_START + 100_000_000));
    // Still the balance queried right after the airdrop.
    assert_eq!(snap.wallet.unwrap().balance, Balance::Known(AIRDROP));
    assert_eq!(snap.notice.unwrap().kind, ErrorKind::NetworkError);
}

#[tokio::test]
async fn spent_wallet_refuses_second_transfer() {
    let fx = start();
    run(&fx, Command::ConnectWallet).await;
    run(&fx, Command::CreateWallet).await;
    run(&fx, Command::AirdropTokens).await;
    run(&fx, transfer()).await;

    let sends = fx.ledger.calls(LedgerOp::SendTransaction);
    let err = fx.session.execute(transfer()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionViolation);
    assert_eq!(fx.ledger.calls(LedgerOp::SendTransaction), sends);
}

#[tokio::test]
async fn account_switch_in_provider_retargets_transfer() {
    let fx = start();
    run(&fx, Command::ConnectWallet).await;
    run(&fx, Command::CreateWallet).await;
    run(&fx, Command::AirdropTokens).await;

    let other = keypair(77).pubkey();
    fx.ledger.set_balance(other, 1_000);
    let mut rx = fx.session.subscribe();
    fx.provider.emit(ProviderEvent::AccountChanged(Some(other)));
    tokio::time::timeout(
        Duration::from_secs(1),
        rx.wait_for(|s| {
            s.account
                .as_ref()
                .is_some_and(|a| a.address == other && a.balance == Balance::Known(1_000))
        }),
    )
    .await
    .unwrap()
    .unwrap();

    run(&fx, transfer()).await;
    assert_eq!(fx.ledger.balance_of(&other), 1_000 + 100_000_000);
    assert_eq!(fx.ledger.balance_of(&fx.account()), ACCOUNT_START);
}

#[tokio::test]
async fn dismiss_clears_notice_only() {
    let fx = start();
    let err = fx.session.execute(Command::AirdropTokens).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionViolation);
    assert!(fx.session.snapshot().notice.is_some());

    let before = fx.session.snapshot();
    let snap = run(&fx, Command::DismissNotice).await;
    assert!(snap.notice.is_none());
    assert_eq!(snap.panel, before.panel);
    assert_eq!(snap.account, before.account);
    assert_eq!(snap.wallet, before.wallet);
}

#[tokio::test]
async fn busy_entities_are_published_while_running() {
    let fx = start();
    fx.provider.set_connect_delay(Duration::from_millis(100));
    let mut rx = fx.session.subscribe();
    let pending = fx.session.submit(Command::ConnectWallet).unwrap();

    tokio::time::timeout(
        Duration::from_secs(1),
        rx.wait_for(|s| s.is_busy(Entity::Account)),
    )
    .await
    .unwrap()
    .unwrap();

    let snap = pending.await.unwrap().unwrap();
    assert!(!snap.is_busy(Entity::Account));
}

#[tokio::test]
async fn session_stops_when_handles_drop() {
    let fx = start();
    let Fixture { session, task, .. } = fx;
    drop(session);
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();
}
