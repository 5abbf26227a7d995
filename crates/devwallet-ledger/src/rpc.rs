//! Solana JSON-RPC transport.
//!
//! Methods used: `getBalance`, `requestAirdrop`, `getLatestBlockhash`,
//! `sendTransaction` and `getSignatureStatuses`. Every response is
//! deserialized into a private struct and converted to core types here.

use async_trait::async_trait;
use jsonrpsee::core::client::{ClientT, Error as ClientError};
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use devwallet_core::{Blockhash, Commitment, LedgerError, Pubkey, SignedTransaction, TxSignature};

use crate::config::LedgerConfig;
use crate::transport::{Ledger, SignatureStatus};

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

/// `{ "context": { "slot": .. }, "value": .. }`
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlockhash {
    blockhash: Blockhash,
    #[allow(dead_code)]
    last_valid_block_height: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcSignatureStatus {
    slot: u64,
    confirmations: Option<u64>,
    err: Option<serde_json::Value>,
    confirmation_status: Option<String>,
}

impl RpcSignatureStatus {
    fn into_status(self) -> SignatureStatus {
        // A null confirmation count means the slot is rooted.
        let commitment = match self.confirmation_status.as_deref().map(str::parse::<Commitment>) {
            Some(Ok(level)) => level,
            _ if self.confirmations.is_none() => Commitment::Finalized,
            _ => Commitment::Processed,
        };
        SignatureStatus {
            slot: self.slot,
            commitment,
            err: self.err.map(|e| e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

fn is_insufficient_funds(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains("insufficient") || lower.contains("no record of a prior credit")
}

/// Map a JSON-RPC error object returned by `method` onto the ledger taxonomy.
pub(crate) fn classify_call(method: &str, code: i32, message: &str, data: Option<&str>) -> LedgerError {
    if method == "requestAirdrop" {
        return LedgerError::FaucetUnavailable(format!("{message} ({code})"));
    }
    if is_insufficient_funds(message) || data.is_some_and(is_insufficient_funds) {
        return LedgerError::InsufficientFunds(message.to_string());
    }
    LedgerError::Rejected(format!("{method}: {message} ({code})"))
}

fn classify(method: &str, err: ClientError) -> LedgerError {
    match err {
        ClientError::Call(obj) => classify_call(
            method,
            obj.code(),
            obj.message(),
            obj.data().map(|raw| raw.get()),
        ),
        other => LedgerError::Network(format!("{method}: {other}")),
    }
}

fn params<I>(values: I) -> Result<ArrayParams, LedgerError>
where
    I: IntoIterator<Item = serde_json::Value>,
{
    let mut params = ArrayParams::new();
    for value in values {
        params
            .insert(value)
            .map_err(|e| LedgerError::Network(format!("encode params: {e}")))?;
    }
    Ok(params)
}

// ---------------------------------------------------------------------------
// RpcLedger
// ---------------------------------------------------------------------------

pub struct RpcLedger {
    client: HttpClient,
    endpoint: String,
}

impl RpcLedger {
    pub fn new(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let client = HttpClientBuilder::default()
            .request_timeout(config.request_timeout)
            .build(&config.rpc_url)
            .map_err(|e| LedgerError::Network(format!("build RPC client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.rpc_url.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<R>(&self, method: &'static str, params: ArrayParams) -> Result<R, LedgerError>
    where
        R: serde::de::DeserializeOwned,
    {
        debug!(method, endpoint = %self.endpoint, "RPC request");
        self.client
            .request(method, params)
            .await
            .map_err(|e| classify(method, e))
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn get_balance(&self, address: &Pubkey, commitment: Commitment) -> Result<u64, LedgerError> {
        let p = params([json!(address.encode()), json!({ "commitment": commitment.as_str() })])?;
        let resp: WithContext<u64> = self.call("getBalance", p).await?;
        Ok(resp.value)
    }

    async fn request_airdrop(
        &self,
        address: &Pubkey,
        lamports: u64,
        commitment: Commitment,
    ) -> Result<TxSignature, LedgerError> {
        let p = params([
            json!(address.encode()),
            json!(lamports),
            json!({ "commitment": commitment.as_str() }),
        ])?;
        self.call("requestAirdrop", p).await
    }

    async fn latest_blockhash(&self, commitment: Commitment) -> Result<Blockhash, LedgerError> {
        let p = params([json!({ "commitment": commitment.as_str() })])?;
        let resp: WithContext<LatestBlockhash> = self.call("getLatestBlockhash", p).await?;
        Ok(resp.value.blockhash)
    }

    async fn send_transaction(
        &self,
        transaction: &SignedTransaction,
        commitment: Commitment,
    ) -> Result<TxSignature, LedgerError> {
        let p = params([
            json!(transaction.to_base58()),
            json!({ "encoding": "base58", "preflightCommitment": commitment.as_str() }),
        ])?;
        self.call("sendTransaction", p).await
    }

    async fn signature_status(&self, signature: &TxSignature) -> Result<Option<SignatureStatus>, LedgerError> {
        let p = params([
            json!([signature.encode()]),
            json!({ "searchTransactionHistory": true }),
        ])?;
        let resp: WithContext<Vec<Option<RpcSignatureStatus>>> =
            self.call("getSignatureStatuses", p).await?;
        Ok(resp
            .value
            .into_iter()
            .next()
            .flatten()
            .map(RpcSignatureStatus::into_status))
    }
}
