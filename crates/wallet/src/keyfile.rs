use chrono::{serde::ts_seconds, DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{Result, WalletError};
use crate::generate::{generate, GeneratedWallet};
use nomen_types::Address;

/// Current on-disk key file schema version.
const KEYFILE_VERSION: u8 = 1;

/// Serialized operator key file written to disk.
///
/// Holds the privileged signing key the registrar uses as the temporary owner
/// of freshly created subnames. Stored plaintext with restrictive file modes;
/// the node refuses to start without one.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyFile {
    pub version: u8,
    pub address: Address,
    pub public_key_hex: String,
    pub private_key_hex: String,
    #[serde(default)]
    pub metadata: KeyMetadata,
}

/// Metadata describing when the key was created.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KeyMetadata {
    #[serde(with = "ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Default for KeyMetadata {
    fn default() -> Self {
        Self {
            created_at: Utc::now(),
            notes: None,
        }
    }
}

impl KeyFile {
    /// Generate a fresh signing key and write it to `path`.
    pub fn generate_to(path: &Path, force: bool, notes: Option<String>) -> Result<KeyFile> {
        if path.exists() && !force {
            return Err(WalletError::KeyFileExists(path.display().to_string()));
        }

        let wallet = generate()?;
        let key_file = KeyFile {
            version: KEYFILE_VERSION,
            address: wallet.address,
            public_key_hex: hex::encode(wallet.public_key),
            private_key_hex: hex::encode(wallet.private_key.as_bytes()),
            metadata: KeyMetadata {
                created_at: Utc::now(),
                notes,
            },
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(&key_file)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(key_file)
    }

    /// Load a key file from disk.
    pub fn load(path: &Path) -> Result<KeyFile> {
        let raw = fs::read_to_string(path)?;
        let key_file: KeyFile = serde_json::from_str(&raw)?;
        key_file.private_key()?;
        Ok(key_file)
    }

    /// Raw private key bytes.
    pub fn private_key(&self) -> Result<[u8; 32]> {
        let decoded = hex::decode(&self.private_key_hex)
            .map_err(|err| WalletError::InvalidPrivateKey(err.to_string()))?;
        decoded
            .try_into()
            .map_err(|_| WalletError::InvalidPrivateKey("key must be 32 bytes".into()))
    }

    /// Wallet material reconstructed from the stored key.
    pub fn wallet(&self) -> Result<GeneratedWallet> {
        Ok(GeneratedWallet::from_private_key(self.private_key()?))
    }
}

/// Parse a private key from a `0x`-optional hex string (env override path).
pub fn private_key_from_hex(raw: &str) -> Result<[u8; 32]> {
    let payload = raw.trim();
    let payload = payload.strip_prefix("0x").unwrap_or(payload);
    let decoded =
        hex::decode(payload).map_err(|err| WalletError::InvalidPrivateKey(err.to_string()))?;
    decoded
        .try_into()
        .map_err(|_| WalletError::InvalidPrivateKey("key must be 32 bytes".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn generate_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keys/operator.key");

        let written = KeyFile::generate_to(&path, false, Some("test".into())).unwrap();
        let loaded = KeyFile::load(&path).unwrap();

        assert_eq!(loaded.address, written.address);
        assert_eq!(loaded.private_key().unwrap(), written.private_key().unwrap());
        assert_eq!(loaded.wallet().unwrap().address, written.address);
    }

    #[test]
    fn refuses_overwrite_without_force() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("operator.key");

        KeyFile::generate_to(&path, false, None).unwrap();
        let err = KeyFile::generate_to(&path, false, None).unwrap_err();
        assert!(matches!(err, WalletError::KeyFileExists(_)));

        // force regenerates in place
        KeyFile::generate_to(&path, true, None).unwrap();
    }

    #[test]
    fn rejects_malformed_key_material() {
        assert!(private_key_from_hex("0xzz").is_err());
        assert!(private_key_from_hex("0x00ff").is_err());
        let ok = private_key_from_hex(&format!("0x{}", "11".repeat(32))).unwrap();
        assert_eq!(ok, [0x11u8; 32]);
    }
}
