//! Ledger RPC clients for nomen.
//!
//! The read side queries registry ownership, account nonces, predicted
//! smart-wallet addresses, and transaction receipts. The write side signs and
//! broadcasts registry/resolver calls and owns the per-signer serialization
//! lane that keeps concurrent registration runs from interleaving their nonce
//! allocations.

pub mod errors;
pub mod nonce;
pub mod read;
pub mod write;

pub use errors::{LedgerError, Result};
pub use nonce::NonceBlock;
pub use read::{await_receipt, HttpLedgerClient, LedgerRead, ReceiptWait, TxOutcome};
pub use write::{LedgerWrite, Signer};
