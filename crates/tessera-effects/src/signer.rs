//! Ed25519 requester signer.

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use std::fmt;
use tessera_core::{Address, AuthSignerEffects, Result};

/// Requester signer holding an Ed25519 key.
///
/// The account address is derived from the verifying key the same way
/// participants check it.
#[derive(Clone)]
pub struct Ed25519AuthSigner {
    signing_key: SigningKey,
}

impl Ed25519AuthSigner {
    /// Signer from a 32-byte seed
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Signer with a fresh OS-random key
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }
}

impl fmt::Debug for Ed25519AuthSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519AuthSigner")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthSignerEffects for Ed25519AuthSigner {
    fn address(&self) -> Address {
        Address::from_public_key(self.signing_key.verifying_key().as_bytes())
    }

    fn public_key(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_bytes().to_vec()
    }

    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        Ok(self.signing_key.sign(message).to_bytes().to_vec())
    }
}
