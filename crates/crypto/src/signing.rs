use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::{CryptoError, Result};

/// Sign an arbitrary payload with an Ed25519 private key.
pub fn sign_payload(private_key: &[u8; 32], payload: &[u8]) -> [u8; 64] {
    let signing_key = SigningKey::from_bytes(private_key);
    signing_key.sign(payload).to_bytes()
}

/// Verify an Ed25519 signature over a payload.
pub fn verify_payload(public_key: &[u8; 32], payload: &[u8], signature: &[u8; 64]) -> Result<bool> {
    let verifying_key =
        VerifyingKey::from_bytes(public_key).map_err(|_| CryptoError::InvalidPublicKey)?;
    let signature = Signature::from_bytes(signature);
    Ok(verifying_key.verify(payload, &signature).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_keypair;

    #[test]
    fn sign_verify_roundtrip() {
        let (sk, pk) = generate_keypair().unwrap();
        let payload = b"nomen signing roundtrip";
        let signature = sign_payload(&sk, payload);
        assert!(verify_payload(&pk, payload, &signature).unwrap());
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let (sk, pk) = generate_keypair().unwrap();
        let signature = sign_payload(&sk, b"original");
        assert!(!verify_payload(&pk, b"tampered", &signature).unwrap());
    }

    #[test]
    fn wrong_key_fails_verification() {
        let (sk, _) = generate_keypair().unwrap();
        let (_, other_pk) = generate_keypair().unwrap();
        let payload = b"payload";
        let signature = sign_payload(&sk, payload);
        assert!(!verify_payload(&other_pk, payload, &signature).unwrap());
    }
}
