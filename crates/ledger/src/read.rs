use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::errors::{LedgerError, Result};
use nomen_types::{Address, NodeId, Receipt, TxId};

/// Read-only view of the ledger.
///
/// Implemented over HTTP for the real endpoint and in-memory for tests;
/// consumers hold it as a trait object so the substitution is invisible.
#[async_trait]
pub trait LedgerRead: Send + Sync {
    /// Current owner of a node. The zero address means "unowned".
    async fn owner_of(&self, node: &NodeId) -> Result<Address>;

    /// Confirmed transaction count for an account.
    async fn nonce_of(&self, account: &Address) -> Result<u64>;

    /// Deterministic deployment address the factory would assign for an
    /// owner credential and deploy nonce. Read-only simulation; the account
    /// need not exist yet.
    async fn predicted_address(
        &self,
        factory: &Address,
        owner: &Address,
        deploy_nonce: u64,
    ) -> Result<Address>;

    /// Receipt for a submitted transaction, `None` while still pending.
    async fn receipt_of(&self, tx: &TxId) -> Result<Option<Receipt>>;
}

/// Outcome of waiting on a transaction, with "still pending at deadline"
/// kept distinct from "included but reverted".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    /// Included and applied.
    Confirmed(Receipt),
    /// Included but rejected by contract logic.
    Reverted(Receipt),
    /// No receipt within the deadline. Inclusion is unverified: the
    /// transaction may still land, so callers must not resubmit blindly.
    TimedOut,
}

/// Bounds for the receipt polling loop.
#[derive(Debug, Clone, Copy)]
pub struct ReceiptWait {
    pub deadline: Duration,
    pub poll_interval: Duration,
}

impl Default for ReceiptWait {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Poll for a receipt until the ledger reaches a verdict or the deadline
/// elapses.
pub async fn await_receipt(
    ledger: &dyn LedgerRead,
    tx: &TxId,
    wait: &ReceiptWait,
) -> Result<TxOutcome> {
    let deadline = Instant::now() + wait.deadline;

    loop {
        if let Some(receipt) = ledger.receipt_of(tx).await? {
            let outcome = if receipt.is_success() {
                TxOutcome::Confirmed(receipt)
            } else {
                TxOutcome::Reverted(receipt)
            };
            return Ok(outcome);
        }

        let now = Instant::now();
        if now >= deadline {
            warn!(tx = %tx, waited_ms = wait.deadline.as_millis() as u64, "receipt wait deadline elapsed");
            return Ok(TxOutcome::TimedOut);
        }

        let remaining = deadline - now;
        tokio::time::sleep(wait.poll_interval.min(remaining)).await;
    }
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    owner: Address,
}

#[derive(Debug, Deserialize)]
struct NonceResponse {
    nonce: u64,
}

#[derive(Debug, Deserialize)]
struct PredictedResponse {
    address: Address,
}

/// Read attempts made for a transient failure before giving up.
const READ_ATTEMPTS: u32 = 3;
/// Initial backoff between read retries; doubles per attempt.
const READ_BACKOFF: Duration = Duration::from_millis(200);

/// HTTP client for the ledger RPC endpoint.
///
/// Serves both the read and write traits; reads retry transient transport
/// failures with backoff, writes never retry.
#[derive(Clone, Debug)]
pub struct HttpLedgerClient {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
}

impl HttpLedgerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<Option<T>> {
        let url = self.endpoint(path);
        let mut backoff = READ_BACKOFF;

        for attempt in 1..=READ_ATTEMPTS {
            match self.get_json_once(operation, &url).await {
                Err(err) if err.is_transient() && attempt < READ_ATTEMPTS => {
                    debug!(%operation, attempt, error = %err, "transient read failure, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                other => return other,
            }
        }
        unreachable!("final attempt returns above")
    }

    async fn get_json_once<T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &str,
    ) -> Result<Option<T>> {
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::OK => Ok(Some(response.json::<T>().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(LedgerError::Endpoint {
                    operation,
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

#[async_trait]
impl LedgerRead for HttpLedgerClient {
    async fn owner_of(&self, node: &NodeId) -> Result<Address> {
        let path = format!("registry/{}/owner", node.to_hex());
        let response: Option<OwnerResponse> = self.get_json("owner_of", &path).await?;
        // An unknown node and a node owned by the zero address read the same.
        Ok(response.map(|dto| dto.owner).unwrap_or(Address::ZERO))
    }

    async fn nonce_of(&self, account: &Address) -> Result<u64> {
        let path = format!("account/{account}/nonce");
        let response: Option<NonceResponse> = self.get_json("nonce_of", &path).await?;
        response
            .map(|dto| dto.nonce)
            .ok_or_else(|| LedgerError::InvalidResponse {
                operation: "nonce_of",
                message: format!("no nonce record for {account}"),
            })
    }

    async fn predicted_address(
        &self,
        factory: &Address,
        owner: &Address,
        deploy_nonce: u64,
    ) -> Result<Address> {
        let path = format!("factory/{factory}/wallet?owner={owner}&deploy_nonce={deploy_nonce}");
        let response: Option<PredictedResponse> = self.get_json("predicted_address", &path).await?;
        response
            .map(|dto| dto.address)
            .ok_or_else(|| LedgerError::InvalidResponse {
                operation: "predicted_address",
                message: format!("factory {factory} returned no prediction"),
            })
    }

    async fn receipt_of(&self, tx: &TxId) -> Result<Option<Receipt>> {
        let path = format!("tx/{}/receipt", tx.to_hex());
        self.get_json("receipt_of", &path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomen_types::TxStatus;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct ScriptedLedger {
        /// Receipts appear after the given number of polls.
        receipts: Mutex<HashMap<TxId, (u32, Receipt)>>,
        polls: Mutex<HashMap<TxId, u32>>,
    }

    impl ScriptedLedger {
        fn schedule(&self, tx: TxId, after_polls: u32, status: TxStatus) {
            let receipt = Receipt {
                tx_id: tx,
                status,
                block_height: 10,
                info: None,
            };
            self.receipts.lock().insert(tx, (after_polls, receipt));
        }
    }

    #[async_trait]
    impl LedgerRead for ScriptedLedger {
        async fn owner_of(&self, _node: &NodeId) -> Result<Address> {
            Ok(Address::ZERO)
        }

        async fn nonce_of(&self, _account: &Address) -> Result<u64> {
            Ok(0)
        }

        async fn predicted_address(
            &self,
            _factory: &Address,
            _owner: &Address,
            _deploy_nonce: u64,
        ) -> Result<Address> {
            Ok(Address::ZERO)
        }

        async fn receipt_of(&self, tx: &TxId) -> Result<Option<Receipt>> {
            let polls = {
                let mut polls = self.polls.lock();
                let entry = polls.entry(*tx).or_insert(0);
                *entry += 1;
                *entry
            };
            Ok(self.receipts.lock().get(tx).and_then(|(after, receipt)| {
                (polls > *after).then(|| receipt.clone())
            }))
        }
    }

    fn fast_wait() -> ReceiptWait {
        ReceiptWait {
            deadline: Duration::from_millis(100),
            poll_interval: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn confirmed_after_a_few_polls() {
        let ledger = ScriptedLedger::default();
        let tx = TxId([1u8; 32]);
        ledger.schedule(tx, 3, TxStatus::Success);

        let outcome = await_receipt(&ledger, &tx, &fast_wait()).await.unwrap();
        assert!(matches!(outcome, TxOutcome::Confirmed(_)));
    }

    #[tokio::test]
    async fn reverted_receipt_is_distinguished() {
        let ledger = ScriptedLedger::default();
        let tx = TxId([2u8; 32]);
        ledger.schedule(tx, 0, TxStatus::Reverted);

        let outcome = await_receipt(&ledger, &tx, &fast_wait()).await.unwrap();
        assert!(matches!(outcome, TxOutcome::Reverted(_)));
    }

    #[tokio::test]
    async fn missing_receipt_times_out() {
        let ledger = ScriptedLedger::default();
        let tx = TxId([3u8; 32]);

        let outcome = await_receipt(&ledger, &tx, &fast_wait()).await.unwrap();
        assert_eq!(outcome, TxOutcome::TimedOut);
    }

    #[test]
    fn endpoint_joins_slashes() {
        let client = HttpLedgerClient::new("http://127.0.0.1:9545/");
        assert_eq!(
            client.endpoint("/tx/0xabc/receipt"),
            "http://127.0.0.1:9545/tx/0xabc/receipt"
        );
    }
}
