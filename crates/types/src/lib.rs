//! Shared types for the nomen subname provisioning service.
//!
//! Addresses, hierarchical names and their derived node identifiers, and the
//! transaction/receipt shapes exchanged with the ledger RPC endpoint.

pub mod address;
pub mod name;
pub mod receipt;
pub mod tx;

pub use address::{
    decode_address, encode_address, is_valid_address, Address, AddressError, ADDRESS_BYTES,
};
pub use name::{
    canonicalize_label, labelhash, namehash, HierarchicalName, LabelId, NameError, NodeId,
};
pub use receipt::{Receipt, TxStatus};
pub use tx::{RegistryCall, SignedTransaction, TransactionRequest, TxId};
