use serde::{Serialize, Serializer};
use zeroize::Zeroize;

use crate::Result;
use nomen_crypto::{derive_address, generate_keypair};
use nomen_types::Address;

/// A private key on its way to the end user.
///
/// This is the only ownership credential for a generated wallet and cannot be
/// recovered if lost, so it is transmitted once and then dropped. The wrapper
/// keeps it out of debug output and wipes the bytes on drop.
pub struct RevealedKey([u8; 32]);

impl RevealedKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex rendering for the one-time handoff to the user.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for RevealedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RevealedKey(<redacted>)")
    }
}

impl Drop for RevealedKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl Serialize for RevealedKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

/// A freshly generated externally-owned account.
#[derive(Debug, Serialize)]
pub struct GeneratedWallet {
    pub address: Address,
    #[serde(skip)]
    pub public_key: [u8; 32],
    pub private_key: RevealedKey,
}

/// Generate a new wallet for a subname destination.
///
/// Fails if the OS secure random source is unavailable.
pub fn generate() -> Result<GeneratedWallet> {
    let (private_key, public_key) = generate_keypair()?;
    let address = derive_address(&public_key);

    Ok(GeneratedWallet {
        address,
        public_key,
        private_key: RevealedKey(private_key),
    })
}

impl GeneratedWallet {
    /// Rebuild wallet material from raw private key bytes (key file loads).
    pub fn from_private_key(private_key: [u8; 32]) -> Self {
        let public_key = nomen_crypto::public_key_of(&private_key);
        Self {
            address: derive_address(&public_key),
            public_key,
            private_key: RevealedKey(private_key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_wallets_are_unique() {
        let a = generate().unwrap();
        let b = generate().unwrap();
        assert_ne!(a.address, b.address);
        assert_ne!(a.private_key.as_bytes(), b.private_key.as_bytes());
    }

    #[test]
    fn address_matches_key_material() {
        let wallet = generate().unwrap();
        let rebuilt = GeneratedWallet::from_private_key(*wallet.private_key.as_bytes());
        assert_eq!(rebuilt.address, wallet.address);
        assert_eq!(rebuilt.public_key, wallet.public_key);
    }

    #[test]
    fn debug_output_redacts_key() {
        let wallet = generate().unwrap();
        let rendered = format!("{:?}", wallet);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&wallet.private_key.to_hex()));
    }

    #[test]
    fn key_serializes_as_hex_string() {
        let wallet = generate().unwrap();
        let json = serde_json::to_value(&wallet).unwrap();
        let key = json["private_key"].as_str().unwrap();
        assert!(key.starts_with("0x"));
        assert_eq!(key.len(), 66);
    }
}
