//! Authenticated envelope for request/response payloads
//!
//! ChaCha20-Poly1305 keyed by a [`SessionSharedSecret`]. The nonce is supplied
//! by the caller so randomness stays behind `RandomEffects`.

use crate::crypto::session::SessionSharedSecret;
use crate::errors::{Result, TesseraError};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use serde::{Deserialize, Serialize};

/// Nonce length for ChaCha20-Poly1305
pub const NONCE_LEN: usize = 12;

/// Encrypted payload with its nonce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEnvelope {
    /// 12-byte nonce for ChaCha20Poly1305
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext including the 16-byte authentication tag
    pub ciphertext: Vec<u8>,
}

impl SealedEnvelope {
    /// Encrypt `plaintext` under `secret`, authenticating `aad`.
    pub fn seal(
        secret: &SessionSharedSecret,
        nonce: [u8; NONCE_LEN],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<Self> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(secret.as_bytes()));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), Payload { msg: plaintext, aad })
            .map_err(|e| TesseraError::crypto(format!("Envelope encryption failed: {e}")))?;

        Ok(Self { nonce, ciphertext })
    }

    /// Decrypt and authenticate the envelope.
    pub fn open(&self, secret: &SessionSharedSecret, aad: &[u8]) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(secret.as_bytes()));
        cipher
            .decrypt(
                Nonce::from_slice(&self.nonce),
                Payload {
                    msg: &self.ciphertext,
                    aad,
                },
            )
            .map_err(|e| TesseraError::crypto(format!("Envelope decryption failed: {e}")))
    }
}
