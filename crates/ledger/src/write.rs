use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;
use zeroize::Zeroize;

use crate::errors::{LedgerError, Result};
use crate::read::HttpLedgerClient;
use nomen_crypto::{derive_address, public_key_of, sign_payload};
use nomen_types::{Address, SignedTransaction, TransactionRequest, TxId};

/// Write access to the ledger.
///
/// Broadcasts a signed call and returns the pending transaction id without
/// waiting for inclusion; that is the caller's job via `await_receipt`.
/// Writes are never retried here: after an uncertain submission a retry risks
/// a duplicate effect.
#[async_trait]
pub trait LedgerWrite: Send + Sync {
    async fn submit(&self, tx: &SignedTransaction) -> Result<TxId>;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    tx_id: TxId,
}

#[async_trait]
impl LedgerWrite for HttpLedgerClient {
    async fn submit(&self, tx: &SignedTransaction) -> Result<TxId> {
        let url = self.endpoint("tx");
        let response = self.client.post(url).json(tx).send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.json::<SubmitResponse>().await?;
            debug!(tx_id = %body.tx_id, method = tx.request.call.method(), "transaction accepted");
            Ok(body.tx_id)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(LedgerError::Endpoint {
                operation: "submit",
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// The privileged signing account plus its submission lane.
///
/// The lane is the per-signer mutual-exclusion region required by the nonce
/// discipline: a registration run holds it from its single `nonce_of` read
/// until the last receipt is observed, so two runs sharing this signer can
/// never interleave submissions or observe overlapping nonce ranges.
pub struct Signer {
    private_key: [u8; 32],
    public_key: [u8; 32],
    address: Address,
    lane: Mutex<()>,
}

impl Signer {
    pub fn new(private_key: [u8; 32]) -> Self {
        let public_key = public_key_of(&private_key);
        Self {
            private_key,
            public_key,
            address: derive_address(&public_key),
            lane: Mutex::new(()),
        }
    }

    /// Account address the ledger sequence-checks.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn public_key(&self) -> &[u8; 32] {
        &self.public_key
    }

    /// Acquire the signer's serialization lane. Hold the guard for the whole
    /// nonce-allocation-and-submit sequence, not just the nonce read.
    pub async fn lock_lane(&self) -> MutexGuard<'_, ()> {
        self.lane.lock().await
    }

    /// Sign a request with this account's key.
    pub fn sign(&self, request: TransactionRequest) -> SignedTransaction {
        let signature = sign_payload(&self.private_key, &request.signing_payload());
        SignedTransaction {
            request,
            public_key: self.public_key,
            signature,
        }
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Drop for Signer {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomen_crypto::verify_payload;
    use nomen_types::{namehash, RegistryCall};

    fn request(nonce: u64, from: Address) -> TransactionRequest {
        TransactionRequest {
            to: Address([0x11; 20]),
            from,
            nonce,
            call: RegistryCall::SetOwner {
                node: namehash("alice.kantina.base.eth").unwrap(),
                owner: Address([0x33; 20]),
            },
        }
    }

    #[test]
    fn signed_transactions_verify() {
        let signer = Signer::new([0x07; 32]);
        let signed = signer.sign(request(5, signer.address()));

        assert!(verify_payload(
            signer.public_key(),
            &signed.request.signing_payload(),
            &signed.signature,
        )
        .unwrap());
    }

    #[test]
    fn signer_address_is_stable() {
        let a = Signer::new([0x07; 32]);
        let b = Signer::new([0x07; 32]);
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn debug_omits_key_material() {
        let signer = Signer::new([0x07; 32]);
        let rendered = format!("{:?}", signer);
        assert!(rendered.contains("address"));
        assert!(!rendered.contains("private"));
    }

    #[tokio::test]
    async fn lane_serializes_holders() {
        let signer = std::sync::Arc::new(Signer::new([0x07; 32]));

        let guard = signer.lock_lane().await;
        let contender = {
            let signer = signer.clone();
            tokio::spawn(async move {
                let _guard = signer.lock_lane().await;
            })
        };

        // The contender cannot finish while the lane is held.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }
}
