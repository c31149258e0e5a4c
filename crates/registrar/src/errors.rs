use serde::Serialize;
use thiserror::Error;

use nomen_ledger::LedgerError;
use nomen_types::{NameError, Receipt, TxId};
use nomen_wallet::WalletError;

/// The write steps of a registration run, in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// Bind the subordinate name under the parent (registry).
    Create,
    /// Point the name at the destination address (resolver).
    BindAddress,
    /// Hand the name over to the destination (registry).
    TransferOwnership,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Create => "create",
            Step::BindAddress => "bind-address",
            Step::TransferOwnership => "transfer-ownership",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of a registration run.
///
/// Step-attributed variants carry the transaction ids of the steps that had
/// already confirmed, so the caller (or an operator) can resume from the
/// correct intermediate state rather than re-running the whole pipeline.
#[derive(Debug, Error)]
pub enum RegistrarError {
    /// Malformed leaf label. Raised before any ledger interaction.
    #[error("invalid label: {0}")]
    InvalidLabel(#[from] NameError),

    /// Wallet generation failed (secure random source unavailable).
    #[error("wallet generation failed: {0}")]
    Wallet(#[from] WalletError),

    /// A read outside any write step failed (existence check, nonce read,
    /// smart-wallet prediction).
    #[error("ledger read failed: {0}")]
    Rpc(#[from] LedgerError),

    /// A submitted write was included but reverted. Never retried here; the
    /// caller should re-run the existence check before trying again.
    #[error("step {step} reverted on-chain: {}", reject_reason(.receipt))]
    Rejected {
        step: Step,
        receipt: Receipt,
        committed: Vec<TxId>,
    },

    /// No receipt within the deadline. The outcome is unknown — the
    /// transaction may still land — so nothing is resubmitted automatically.
    #[error("step {step} inclusion unverified within the deadline (tx {submitted})")]
    InclusionTimeout {
        step: Step,
        submitted: TxId,
        committed: Vec<TxId>,
    },

    /// Transport-level failure while submitting or polling a write step.
    #[error("rpc failure during step {step}: {source}")]
    StepRpc {
        step: Step,
        source: LedgerError,
        committed: Vec<TxId>,
    },
}

fn reject_reason(receipt: &Receipt) -> &str {
    receipt.info.as_deref().unwrap_or("no revert reason")
}

impl RegistrarError {
    /// The step a failure is attributed to, if it happened inside one.
    pub fn step(&self) -> Option<Step> {
        match self {
            RegistrarError::Rejected { step, .. }
            | RegistrarError::InclusionTimeout { step, .. }
            | RegistrarError::StepRpc { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Transaction ids of steps that confirmed before the failure.
    pub fn committed(&self) -> &[TxId] {
        match self {
            RegistrarError::Rejected { committed, .. }
            | RegistrarError::InclusionTimeout { committed, .. }
            | RegistrarError::StepRpc { committed, .. } => committed,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistrarError>;
