//! In-memory ledger for tests.
//!
//! Accepted transfers and airdrops stay pending: their balance changes only
//! land once a status poll first reports the signature as `confirmed`.
//! Statuses climb from `processed` to `confirmed` after a configurable number
//! of polls, so confirmation waits can be exercised without a network.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

use devwallet_core::constants::DEFAULT_LAMPORTS_PER_SIGNATURE;
use devwallet_core::crypto::verify;
use devwallet_core::{Blockhash, Commitment, LedgerError, Pubkey, SignedTransaction, TxSignature};

use crate::transport::{Ledger, SignatureStatus};

/// Transport operations, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerOp {
    GetBalance,
    RequestAirdrop,
    LatestBlockhash,
    SendTransaction,
    SignatureStatus,
}

/// Balance changes a transaction makes once confirmed.
#[derive(Debug, Default)]
struct Effects {
    debits: Vec<(Pubkey, u64)>,
    credits: Vec<(Pubkey, u64)>,
}

#[derive(Debug)]
struct Pending {
    slot: u64,
    polls: u32,
    err: Option<String>,
    effects: Option<Effects>,
}

#[derive(Debug)]
struct State {
    balances: HashMap<Pubkey, u64>,
    statuses: HashMap<TxSignature, Pending>,
    fee_per_signature: u64,
    polls_to_confirm: u32,
    never_confirm: bool,
    faucet_enabled: bool,
    failures: HashMap<LedgerOp, VecDeque<LedgerError>>,
    fail_next_execution: Option<String>,
    calls: HashMap<LedgerOp, usize>,
    slot: u64,
    nonce: u64,
}

impl State {
    fn enter(&mut self, op: LedgerOp) -> Result<(), LedgerError> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_signature(&mut self) -> TxSignature {
        self.nonce += 1;
        let mut bytes = [0xA5u8; 64];
        bytes[..8].copy_from_slice(&self.nonce.to_le_bytes());
        TxSignature::new(bytes)
    }

    fn record(&mut self, signature: TxSignature, err: Option<String>, effects: Effects) {
        self.slot += 1;
        self.statuses.insert(
            signature,
            Pending {
                slot: self.slot,
                polls: 0,
                err,
                effects: Some(effects),
            },
        );
    }

    /// Confirmed balance minus debits still waiting on confirmation.
    fn spendable(&self, address: &Pubkey) -> u64 {
        let pending: u64 = self
            .statuses
            .values()
            .filter_map(|p| p.effects.as_ref())
            .flat_map(|e| e.debits.iter())
            .filter(|(from, _)| from == address)
            .map(|(_, lamports)| *lamports)
            .sum();
        self.balances
            .get(address)
            .copied()
            .unwrap_or(0)
            .saturating_sub(pending)
    }

    fn apply(&mut self, effects: Effects) {
        for (from, lamports) in effects.debits {
            let balance = self.balances.entry(from).or_default();
            *balance = balance.saturating_sub(lamports);
        }
        for (to, lamports) in effects.credits {
            *self.balances.entry(to).or_default() += lamports;
        }
    }
}

pub struct MemoryLedger {
    state: Mutex<State>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                balances: HashMap::new(),
                statuses: HashMap::new(),
                fee_per_signature: DEFAULT_LAMPORTS_PER_SIGNATURE,
                polls_to_confirm: 0,
                never_confirm: false,
                faucet_enabled: true,
                failures: HashMap::new(),
                fail_next_execution: None,
                calls: HashMap::new(),
                slot: 0,
                nonce: 0,
            }),
        }
    }

    pub fn set_balance(&self, address: Pubkey, lamports: u64) {
        self.state.lock().balances.insert(address, lamports);
    }

    /// Confirmed balance; pending transactions are not included.
    pub fn balance_of(&self, address: &Pubkey) -> u64 {
        self.state.lock().balances.get(address).copied().unwrap_or(0)
    }

    pub fn set_fee_per_signature(&self, lamports: u64) {
        self.state.lock().fee_per_signature = lamports;
    }

    pub fn fee_per_signature(&self) -> u64 {
        self.state.lock().fee_per_signature
    }

    /// Number of status polls that report `processed` before `confirmed`.
    pub fn set_polls_to_confirm(&self, polls: u32) {
        self.state.lock().polls_to_confirm = polls;
    }

    /// Keep every signature at `processed` forever.
    pub fn set_never_confirm(&self, never: bool) {
        self.state.lock().never_confirm = never;
    }

    pub fn set_faucet_enabled(&self, enabled: bool) {
        self.state.lock().faucet_enabled = enabled;
    }

    /// Fail the next call of `op` with `err`. Queued per operation.
    pub fn fail_next(&self, op: LedgerOp, err: LedgerError) {
        self.state.lock().failures.entry(op).or_default().push_back(err);
    }

    /// Accept the next transaction but report it as failed on execution.
    pub fn fail_next_execution(&self, reason: impl Into<String>) {
        self.state.lock().fail_next_execution = Some(reason.into());
    }

    pub fn calls(&self, op: LedgerOp) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().calls.values().sum()
    }
}

fn read_key(message: &[u8], offset: usize) -> Result<Pubkey, LedgerError> {
    message
        .get(offset..offset + 32)
        .and_then(|slice| <[u8; 32]>::try_from(slice).ok())
        .map(Pubkey::new)
        .ok_or_else(|| LedgerError::Rejected("malformed transfer message".into()))
}

/// Pull `(from, to, lamports)` out of a single-transfer message.
fn decode_transfer(message: &[u8]) -> Result<(Pubkey, Pubkey, u64), LedgerError> {
    let from = read_key(message, 4)?;
    let to = read_key(message, 36)?;
    let lamports = message
        .get(142..150)
        .and_then(|slice| <[u8; 8]>::try_from(slice).ok())
        .map(u64::from_le_bytes)
        .ok_or_else(|| LedgerError::Rejected("malformed transfer message".into()))?;
    Ok((from, to, lamports))
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn get_balance(&self, address: &Pubkey, _commitment: Commitment) -> Result<u64, LedgerError> {
        let mut state = self.state.lock();
        state.enter(LedgerOp::GetBalance)?;
        Ok(state.balances.get(address).copied().unwrap_or(0))
    }

    async fn request_airdrop(
        &self,
        address: &Pubkey,
        lamports: u64,
        _commitment: Commitment,
    ) -> Result<TxSignature, LedgerError> {
        let mut state = self.state.lock();
        state.enter(LedgerOp::RequestAirdrop)?;
        if !state.faucet_enabled {
            return Err(LedgerError::FaucetUnavailable("airdrops disabled".into()));
        }
        let signature = state.next_signature();
        let effects = Effects {
            credits: vec![(*address, lamports)],
            ..Effects::default()
        };
        state.record(signature, None, effects);
        Ok(signature)
    }

    async fn latest_blockhash(&self, _commitment: Commitment) -> Result<Blockhash, LedgerError> {
        let mut state = self.state.lock();
        state.enter(LedgerOp::LatestBlockhash)?;
        let mut bytes = [0x42u8; 32];
        bytes[..8].copy_from_slice(&state.slot.to_le_bytes());
        Ok(Blockhash::new(bytes))
    }

    async fn send_transaction(
        &self,
        transaction: &SignedTransaction,
        _commitment: Commitment,
    ) -> Result<TxSignature, LedgerError> {
        let mut state = self.state.lock();
        state.enter(LedgerOp::SendTransaction)?;

        let (from, to, lamports) = decode_transfer(transaction.message())?;
        let signature = transaction.signature();
        verify(&from, transaction.message(), &signature)
            .map_err(|_| LedgerError::Rejected("signature verification failed".into()))?;

        let fee = state.fee_per_signature;
        let have = state.spendable(&from);
        let need = lamports.saturating_add(fee);
        if have < need {
            return Err(LedgerError::InsufficientFunds(format!(
                "account has {have} lamports, transfer needs {need}"
            )));
        }

        if let Some(reason) = state.fail_next_execution.take() {
            // Fee is charged even when execution fails.
            let effects = Effects {
                debits: vec![(from, fee)],
                ..Effects::default()
            };
            state.record(signature, Some(reason), effects);
            return Ok(signature);
        }

        let effects = Effects {
            debits: vec![(from, need)],
            credits: vec![(to, lamports)],
        };
        state.record(signature, None, effects);
        Ok(signature)
    }

    async fn signature_status(&self, signature: &TxSignature) -> Result<Option<SignatureStatus>, LedgerError> {
        let mut state = self.state.lock();
        state.enter(LedgerOp::SignatureStatus)?;
        let polls_to_confirm = state.polls_to_confirm;
        let never_confirm = state.never_confirm;
        let Some(pending) = state.statuses.get_mut(signature) else {
            return Ok(None);
        };
        pending.polls += 1;
        let commitment = if never_confirm || pending.polls <= polls_to_confirm {
            Commitment::Processed
        } else {
            Commitment::Confirmed
        };
        let status = SignatureStatus {
            slot: pending.slot,
            commitment,
            err: pending.err.clone(),
        };
        let settled = match commitment {
            Commitment::Processed => None,
            _ => pending.effects.take(),
        };
        if let Some(effects) = settled {
            state.apply(effects);
        }
        Ok(Some(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devwallet_core::{KeyPair, TransferMessage};

    fn transfer(ledger_hash: Blockhash, from: &KeyPair, to: Pubkey, lamports: u64) -> SignedTransaction {
        TransferMessage::new(from.pubkey(), to, lamports, ledger_hash)
            .unwrap()
            .sign(from)
            .unwrap()
    }

    #[tokio::test]
    async fn airdrop_credits_on_confirmation() {
        let ledger = MemoryLedger::new();
        let pk = Pubkey::new([1u8; 32]);
        let sig = ledger.request_airdrop(&pk, 2_000, Commitment::Confirmed).await.unwrap();
        assert_eq!(ledger.get_balance(&pk, Commitment::Confirmed).await, Ok(0));
        let status = ledger.signature_status(&sig).await.unwrap().unwrap();
        assert!(status.satisfies(Commitment::Confirmed));
        assert_eq!(ledger.get_balance(&pk, Commitment::Confirmed).await, Ok(2_000));

        // Later polls do not credit again.
        ledger.signature_status(&sig).await.unwrap();
        assert_eq!(ledger.balance_of(&pk), 2_000);
    }

    #[tokio::test]
    async fn unconfirmed_airdrop_is_invisible() {
        let ledger = MemoryLedger::new();
        ledger.set_never_confirm(true);
        let pk = Pubkey::new([1u8; 32]);
        let sig = ledger.request_airdrop(&pk, 2_000, Commitment::Confirmed).await.unwrap();
        for _ in 0..3 {
            let s = ledger.signature_status(&sig).await.unwrap().unwrap();
            assert_eq!(s.commitment, Commitment::Processed);
        }
        assert_eq!(ledger.get_balance(&pk, Commitment::Confirmed).await, Ok(0));
    }

    #[tokio::test]
    async fn disabled_faucet() {
        let ledger = MemoryLedger::new();
        ledger.set_faucet_enabled(false);
        let err = ledger
            .request_airdrop(&Pubkey::new([1u8; 32]), 1, Commitment::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::FaucetUnavailable(_)));
    }

    #[tokio::test]
    async fn transfer_charges_fee() {
        let ledger = MemoryLedger::new();
        let sender = KeyPair::from_secret_bytes([2u8; 32]);
        let receiver = Pubkey::new([3u8; 32]);
        ledger.set_balance(sender.pubkey(), 1_000_000);
        let hash = ledger.latest_blockhash(Commitment::Confirmed).await.unwrap();
        let sig = ledger
            .send_transaction(&transfer(hash, &sender, receiver, 400_000), Commitment::Confirmed)
            .await
            .unwrap();
        assert_eq!(ledger.balance_of(&receiver), 0);
        ledger.signature_status(&sig).await.unwrap();
        assert_eq!(ledger.balance_of(&sender.pubkey()), 1_000_000 - 400_000 - 5_000);
        assert_eq!(ledger.balance_of(&receiver), 400_000);
    }

    #[tokio::test]
    async fn pending_debits_count_against_balance() {
        let ledger = MemoryLedger::new();
        ledger.set_never_confirm(true);
        let sender = KeyPair::from_secret_bytes([2u8; 32]);
        ledger.set_balance(sender.pubkey(), 1_000_000);
        let receiver = Pubkey::new([3u8; 32]);
        ledger
            .send_transaction(
                &transfer(Blockhash::new([0u8; 32]), &sender, receiver, 600_000),
                Commitment::Confirmed,
            )
            .await
            .unwrap();
        let err = ledger
            .send_transaction(
                &transfer(Blockhash::new([1u8; 32]), &sender, receiver, 600_000),
                Commitment::Confirmed,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds(_)));
        assert_eq!(ledger.balance_of(&sender.pubkey()), 1_000_000);
    }

    #[tokio::test]
    async fn transfer_over_balance_is_insufficient() {
        let ledger = MemoryLedger::new();
        let sender = KeyPair::from_secret_bytes([2u8; 32]);
        ledger.set_balance(sender.pubkey(), 1_000);
        let hash = Blockhash::new([0u8; 32]);
        let err = ledger
            .send_transaction(&transfer(hash, &sender, Pubkey::new([3u8; 32]), 1_000), Commitment::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds(_)));
        assert_eq!(ledger.balance_of(&sender.pubkey()), 1_000);
    }

    #[tokio::test]
    async fn status_lags_by_polls() {
        let ledger = MemoryLedger::new();
        ledger.set_polls_to_confirm(2);
        let sig = ledger
            .request_airdrop(&Pubkey::new([1u8; 32]), 1, Commitment::Confirmed)
            .await
            .unwrap();
        for _ in 0..2 {
            let s = ledger.signature_status(&sig).await.unwrap().unwrap();
            assert_eq!(s.commitment, Commitment::Processed);
        }
        let s = ledger.signature_status(&sig).await.unwrap().unwrap();
        assert_eq!(s.commitment, Commitment::Confirmed);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_once() {
        let ledger = MemoryLedger::new();
        let pk = Pubkey::new([1u8; 32]);
        ledger.fail_next(LedgerOp::GetBalance, LedgerError::Network("down".into()));
        assert_eq!(
            ledger.get_balance(&pk, Commitment::Confirmed).await,
            Err(LedgerError::Network("down".into()))
        );
        assert_eq!(ledger.get_balance(&pk, Commitment::Confirmed).await, Ok(0));
        assert_eq!(ledger.calls(LedgerOp::GetBalance), 2);
    }

    #[tokio::test]
    async fn unknown_signature_has_no_status() {
        let ledger = MemoryLedger::new();
        let status = ledger
            .signature_status(&TxSignature::new([9u8; 64]))
            .await
            .unwrap();
        assert_eq!(status, None);
    }
}
