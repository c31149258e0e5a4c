use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("key generation failed: {0}")]
    KeyGeneration(#[from] nomen_crypto::CryptoError),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("key file already exists: {0} (pass force to overwrite)")]
    KeyFileExists(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WalletError>;
