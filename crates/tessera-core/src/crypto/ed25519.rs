//! Ed25519 verification used for requester proofs and encryptor authorizations.

use crate::errors::{Result, TesseraError};
use ed25519_dalek::{Signature, VerifyingKey};

/// Verify an Ed25519 signature.
///
/// Malformed keys or signatures are errors; a well-formed signature that does
/// not verify is `Ok(false)`.
pub fn ed25519_verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool> {
    let key_bytes: [u8; 32] = public_key
        .try_into()
        .map_err(|_| TesseraError::invalid("Ed25519 public key must be 32 bytes"))?;
    let sig_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| TesseraError::invalid("Ed25519 signature must be 64 bytes"))?;

    let verifying_key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| TesseraError::invalid(format!("Invalid Ed25519 public key: {e}")))?;
    let signature = Signature::from_bytes(&sig_bytes);

    Ok(verifying_key.verify_strict(message, &signature).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    #[test]
    fn test_verify_accepts_valid_and_rejects_other_message() {
        let key = SigningKey::from_bytes(&[3u8; 32]);
        let sig = key.sign(b"message").to_bytes();
        let pk = key.verifying_key().to_bytes();

        assert!(ed25519_verify(&pk, b"message", &sig).unwrap());
        assert!(!ed25519_verify(&pk, b"other", &sig).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_lengths() {
        assert!(ed25519_verify(&[0u8; 31], b"m", &[0u8; 64]).is_err());
        assert!(ed25519_verify(&[0u8; 32], b"m", &[0u8; 10]).is_err());
    }
}
