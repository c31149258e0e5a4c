use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::errors::{RegistrarError, Result, Step};
use crate::zone::ParentZone;
use nomen_ledger::{await_receipt, LedgerRead, LedgerWrite, NonceBlock, ReceiptWait, Signer, TxOutcome};
use nomen_types::{Address, HierarchicalName, RegistryCall, TransactionRequest, TxId};
use nomen_wallet::{generate, RevealedKey};

/// Where a newly provisioned subname should point.
#[derive(Debug)]
pub enum Destination {
    /// Generate a fresh key-pair wallet and hand its key to the caller.
    Generated,
    /// A wallet the caller already controls.
    External(Address),
    /// A smart-contract wallet that does not exist yet; its address is
    /// predicted from the factory before any transaction is submitted.
    SmartWallet { owner: Address, deploy_nonce: u64 },
}

/// Result of the read-only existence pre-flight.
#[derive(Debug, Clone, Serialize)]
pub struct NameStatus {
    pub exists: bool,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Address>,
}

/// Transaction ids of a completed registration run, in submission order.
#[derive(Debug, Clone, Serialize)]
pub struct TxTrail {
    pub create: TxId,
    pub bind_address: TxId,
    pub transfer_ownership: TxId,
}

/// A successfully provisioned subname.
#[derive(Debug, Serialize)]
pub struct Registration {
    pub name: String,
    pub address: Address,
    /// Present only for generated wallets; transmitted exactly once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<RevealedKey>,
    /// Present only for smart-wallet destinations: the credential that will
    /// control the wallet once deployed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart_wallet_owner: Option<Address>,
    pub transactions: TxTrail,
}

/// The registration orchestrator.
///
/// Holds the privileged signer that temporarily owns each new subname, the
/// zone configuration, and trait-object handles to the ledger so tests can
/// substitute an in-memory ledger for the HTTP client.
pub struct Registrar {
    ledger: Arc<dyn LedgerRead>,
    writer: Arc<dyn LedgerWrite>,
    signer: Arc<Signer>,
    zone: ParentZone,
    receipt_wait: ReceiptWait,
}

impl Registrar {
    pub fn new(
        ledger: Arc<dyn LedgerRead>,
        writer: Arc<dyn LedgerWrite>,
        signer: Arc<Signer>,
        zone: ParentZone,
        receipt_wait: ReceiptWait,
    ) -> Self {
        Self {
            ledger,
            writer,
            signer,
            zone,
            receipt_wait,
        }
    }

    pub fn zone(&self) -> &ParentZone {
        &self.zone
    }

    /// Read-only pre-flight: is this label already taken?
    ///
    /// Not atomic with registration — two callers can both see `exists:
    /// false` and race; the registry itself then reverts the loser's create.
    pub async fn check(&self, label: &str) -> Result<NameStatus> {
        let name = self.zone.name(label)?;
        let owner = self.ledger.owner_of(&name.node()).await?;

        Ok(NameStatus {
            exists: !owner.is_zero(),
            name: name.full(),
            owner: (!owner.is_zero()).then_some(owner),
        })
    }

    /// Provision `label` and hand it to `destination`.
    ///
    /// One `nonce_of` read at run start; three writes at n, n+1, n+2 with the
    /// signer's lane held throughout; each write awaited before the next.
    #[instrument(skip(self))]
    pub async fn register(&self, label: &str, destination: Destination) -> Result<Registration> {
        let name = self.zone.name(label)?;

        // Destination selection happens before any ledger write; an invalid
        // destination must never cost a transaction.
        let (address, private_key, smart_wallet_owner) = match destination {
            Destination::Generated => {
                let wallet = generate()?;
                info!(name = %name, address = %wallet.address, "generated destination wallet");
                (wallet.address, Some(wallet.private_key), None)
            }
            Destination::External(address) => (address, None, None),
            Destination::SmartWallet { owner, deploy_nonce } => {
                let predicted = self
                    .ledger
                    .predicted_address(&self.zone.wallet_factory, &owner, deploy_nonce)
                    .await?;
                info!(name = %name, %predicted, %owner, "predicted smart-wallet destination");
                (predicted, None, Some(owner))
            }
        };

        let transactions = self.provision(&name, address).await?;

        Ok(Registration {
            name: name.full(),
            address,
            private_key,
            smart_wallet_owner,
            transactions,
        })
    }

    /// The three-write pipeline: create under the parent with the signer as
    /// temporary owner, bind the destination address, then hand over
    /// ownership.
    async fn provision(&self, name: &HierarchicalName, destination: Address) -> Result<TxTrail> {
        let node = name.node();
        let signer_address = self.signer.address();

        let _lane = self.signer.lock_lane().await;
        let mut nonces = NonceBlock::starting_at(self.ledger.nonce_of(&signer_address).await?);
        let mut committed: Vec<TxId> = Vec::with_capacity(3);

        info!(name = %name, base_nonce = nonces.base(), "creating subname");
        let create = self
            .run_step(
                Step::Create,
                TransactionRequest {
                    to: self.zone.registry,
                    from: signer_address,
                    nonce: nonces.take(),
                    call: RegistryCall::CreateSubnode {
                        parent: name.parent_node(),
                        label: name.label_id(),
                        owner: signer_address,
                        resolver: self.zone.resolver,
                        ttl: self.zone.subnode_ttl,
                    },
                },
                &committed,
            )
            .await?;
        committed.push(create);

        info!(name = %name, %destination, "binding resolved address");
        let bind_address = self
            .run_step(
                Step::BindAddress,
                TransactionRequest {
                    to: self.zone.resolver,
                    from: signer_address,
                    nonce: nonces.take(),
                    call: RegistryCall::SetAddr {
                        node,
                        addr: destination,
                    },
                },
                &committed,
            )
            .await?;
        committed.push(bind_address);

        info!(name = %name, new_owner = %destination, "transferring ownership");
        let transfer_ownership = self
            .run_step(
                Step::TransferOwnership,
                TransactionRequest {
                    to: self.zone.registry,
                    from: signer_address,
                    nonce: nonces.take(),
                    call: RegistryCall::SetOwner {
                        node,
                        owner: destination,
                    },
                },
                &committed,
            )
            .await?;

        Ok(TxTrail {
            create,
            bind_address,
            transfer_ownership,
        })
    }

    /// Standalone ownership handoff for a name this signer still owns.
    ///
    /// Repairs the recoverable intermediate state left by a run that failed
    /// after `create`, and serves user-initiated transfers.
    pub async fn transfer(&self, label: &str, new_owner: Address) -> Result<TxId> {
        let name = self.zone.name(label)?;
        let signer_address = self.signer.address();

        let _lane = self.signer.lock_lane().await;
        let mut nonces = NonceBlock::starting_at(self.ledger.nonce_of(&signer_address).await?);

        info!(name = %name, %new_owner, "transferring subname ownership");
        self.run_step(
            Step::TransferOwnership,
            TransactionRequest {
                to: self.zone.registry,
                from: signer_address,
                nonce: nonces.take(),
                call: RegistryCall::SetOwner {
                    node: name.node(),
                    owner: new_owner,
                },
            },
            &[],
        )
        .await
    }

    /// Sign, submit, and block on the receipt of one write step.
    async fn run_step(
        &self,
        step: Step,
        request: TransactionRequest,
        committed: &[TxId],
    ) -> Result<TxId> {
        let signed = self.signer.sign(request);
        let tx_id = self
            .writer
            .submit(&signed)
            .await
            .map_err(|source| RegistrarError::StepRpc {
                step,
                source,
                committed: committed.to_vec(),
            })?;

        let outcome = await_receipt(self.ledger.as_ref(), &tx_id, &self.receipt_wait)
            .await
            .map_err(|source| RegistrarError::StepRpc {
                step,
                source,
                committed: committed.to_vec(),
            })?;

        match outcome {
            TxOutcome::Confirmed(receipt) => {
                info!(%step, tx = %tx_id, block = receipt.block_height, "step confirmed");
                Ok(tx_id)
            }
            TxOutcome::Reverted(receipt) => Err(RegistrarError::Rejected {
                step,
                receipt,
                committed: committed.to_vec(),
            }),
            TxOutcome::TimedOut => Err(RegistrarError::InclusionTimeout {
                step,
                submitted: tx_id,
                committed: committed.to_vec(),
            }),
        }
    }
}
