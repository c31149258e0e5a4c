//! Wallet material for nomen.
//!
//! Fresh key-pair generation for end users (the private key is handed to the
//! caller exactly once and exists nowhere else), plus the on-disk key file
//! for the operator's privileged signing account.

pub mod errors;
pub mod generate;
pub mod keyfile;

pub use errors::{Result, WalletError};
pub use generate::{generate, GeneratedWallet, RevealedKey};
pub use keyfile::KeyFile;
