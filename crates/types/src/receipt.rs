use serde::{Deserialize, Serialize};

use crate::tx::TxId;

/// Terminal status of an included transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Included and applied.
    Success,
    /// Included but rejected by contract logic (e.g. subnode already bound).
    Reverted,
}

/// Inclusion receipt for a submitted transaction.
///
/// A receipt existing means the ledger reached a verdict; "still pending" is
/// the absence of a receipt, not a receipt state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// ID of the transaction the receipt corresponds to.
    pub tx_id: TxId,
    /// Outcome of execution.
    pub status: TxStatus,
    /// Height of the block the transaction landed in.
    pub block_height: u64,
    /// Optional human-readable revert reason or execution note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }
}
