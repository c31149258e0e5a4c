//! Registration orchestrator for nomen subnames.
//!
//! Sequences wallet selection, subname creation, address binding, and the
//! ownership handoff into one run against the ledger, with a single nonce
//! read per run and the signer's submission lane held across all three
//! writes. Every failure names the step it happened at and the transaction
//! ids already committed, so a caller can resume from the right intermediate
//! state instead of restarting the pipeline.

pub mod errors;
pub mod registrar;
pub mod zone;

pub use errors::{RegistrarError, Result, Step};
pub use registrar::{Destination, NameStatus, Registrar, Registration, TxTrail};
pub use zone::ParentZone;
