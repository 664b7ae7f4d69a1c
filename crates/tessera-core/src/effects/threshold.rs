//! Threshold encryption primitives
//!
//! Treated as black boxes with fixed input/output shapes. The requester side
//! needs encryption, combination and final decryption; a participant only
//! needs to produce its own share.

use crate::errors::Result;
use crate::messages::{Ciphertext, CiphertextHeader, DecryptionShare};
use crate::types::DkgPublicKey;
use async_trait::async_trait;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret recovered by combining a threshold of shares.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ThresholdSharedSecret(Vec<u8>);

impl ThresholdSharedSecret {
    /// Wrap combined secret material.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ThresholdSharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ThresholdSharedSecret")
            .field(&"<redacted>")
            .finish()
    }
}

/// Requester-side threshold primitives
#[async_trait]
pub trait ThresholdCryptoEffects: Send + Sync {
    /// Encrypt `plaintext` to a ritual key, binding `aad`
    async fn encrypt(
        &self,
        plaintext: &[u8],
        public_key: &DkgPublicKey,
        aad: &[u8],
    ) -> Result<Ciphertext>;

    /// Combine a threshold of shares into the shared secret
    async fn combine_shares(&self, shares: &[DecryptionShare]) -> Result<ThresholdSharedSecret>;

    /// Decrypt a ciphertext with the combined secret, checking `aad`
    async fn decrypt(
        &self,
        ciphertext: &Ciphertext,
        shared_secret: &ThresholdSharedSecret,
        aad: &[u8],
    ) -> Result<Vec<u8>>;
}

/// Participant-side share production
#[async_trait]
pub trait DecryptionShareEffects: Send + Sync {
    /// Produce this participant's share for a ciphertext header
    ///
    /// Fails unless the header was produced for exactly `aad`.
    async fn create_share(&self, header: &CiphertextHeader, aad: &[u8]) -> Result<DecryptionShare>;
}
