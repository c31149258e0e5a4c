//! Cryptographic primitives for nomen.
//!
//! Ed25519 key-pairs, account address derivation, and transaction payload
//! signing. All randomness comes from the operating system CSPRNG; if that
//! source is unavailable the failure is surfaced as an error, never worked
//! around with a weaker source.

pub mod keys;
pub mod signing;

pub use keys::{derive_address, generate_keypair, public_key_of};
pub use signing::{sign_payload, verify_payload};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("secure random source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("invalid public key bytes")]
    InvalidPublicKey,
}

pub type Result<T> = std::result::Result<T, CryptoError>;
