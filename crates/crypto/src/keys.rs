use ed25519_dalek::SigningKey;
use rand_core::{OsRng, RngCore};
use sha3::{Digest, Keccak256};

use crate::{CryptoError, Result};
use nomen_types::{Address, ADDRESS_BYTES};

/// Generate a new Ed25519 key pair from the OS CSPRNG.
///
/// Returns `(private_key, public_key)`. Fails if the entropy source cannot be
/// read rather than falling back to anything weaker.
pub fn generate_keypair() -> Result<([u8; 32], [u8; 32])> {
    let mut secret = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut secret)
        .map_err(|err| CryptoError::EntropyUnavailable(err.to_string()))?;

    let signing_key = SigningKey::from_bytes(&secret);
    let verifying_key = signing_key.verifying_key();

    Ok((secret, verifying_key.to_bytes()))
}

/// Public key corresponding to a 32-byte private key.
pub fn public_key_of(private_key: &[u8; 32]) -> [u8; 32] {
    SigningKey::from_bytes(private_key).verifying_key().to_bytes()
}

/// Derive the account address for a public key.
///
/// The address is the trailing 20 bytes of `keccak256(public_key)`.
pub fn derive_address(public_key: &[u8; 32]) -> Address {
    let mut hasher = Keccak256::new();
    hasher.update(public_key);
    let digest: [u8; 32] = hasher.finalize().into();

    let mut bytes = [0u8; ADDRESS_BYTES];
    bytes.copy_from_slice(&digest[32 - ADDRESS_BYTES..]);
    Address(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_distinct() {
        let (sk_a, pk_a) = generate_keypair().unwrap();
        let (sk_b, pk_b) = generate_keypair().unwrap();
        assert_ne!(sk_a, sk_b);
        assert_ne!(pk_a, pk_b);
    }

    #[test]
    fn public_key_matches_private() {
        let (sk, pk) = generate_keypair().unwrap();
        assert_eq!(public_key_of(&sk), pk);
    }

    #[test]
    fn address_derivation_is_deterministic() {
        let pk = [0x42u8; 32];
        assert_eq!(derive_address(&pk), derive_address(&pk));
    }

    #[test]
    fn distinct_keys_get_distinct_addresses() {
        let (_, pk_a) = generate_keypair().unwrap();
        let (_, pk_b) = generate_keypair().unwrap();
        assert_ne!(derive_address(&pk_a), derive_address(&pk_b));
    }

    #[test]
    fn derived_address_is_never_zero_sentinel() {
        let (_, pk) = generate_keypair().unwrap();
        assert!(!derive_address(&pk).is_zero());
    }
}
