//! Per-attempt session key agreement
//!
//! The requester holds one ephemeral [`SessionStaticSecret`] per decryption
//! attempt; each participant publishes a long-lived [`SessionPublicKey`].
//! X25519 between the two, expanded with HKDF-SHA256, gives the
//! [`SessionSharedSecret`] that keys the request/response envelope for that
//! participant. The derivation is symmetric, so the participant recomputes the
//! same secret from its static secret and the requester's ephemeral public key.

use crate::errors::{Result, TesseraError};
use curve25519_dalek::montgomery::MontgomeryPoint;
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of session keys and shared secrets in bytes.
pub const SESSION_KEY_LEN: usize = 32;

const HKDF_SALT: &[u8] = b"tessera-session-v1";
const HKDF_INFO: &[u8] = b"threshold-decryption-request";

/// Secret half of a session key pair. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionStaticSecret([u8; SESSION_KEY_LEN]);

impl SessionStaticSecret {
    /// Wrap 32 bytes of key material. Clamping happens at use.
    pub fn from_bytes(bytes: [u8; SESSION_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Public half of this key.
    pub fn public_key(&self) -> SessionPublicKey {
        SessionPublicKey(MontgomeryPoint::mul_base_clamped(self.0).to_bytes())
    }

    /// Derive the shared secret with a peer's public key.
    ///
    /// Fails if the peer key is a low-order point, which would yield an
    /// all-zero Diffie-Hellman output.
    pub fn derive_shared_secret(&self, peer: &SessionPublicKey) -> Result<SessionSharedSecret> {
        let mut dh = MontgomeryPoint(peer.0).mul_clamped(self.0).to_bytes();
        if dh.iter().all(|b| *b == 0) {
            return Err(TesseraError::crypto(
                "Key agreement produced a degenerate shared secret",
            ));
        }

        let hkdf = Hkdf::<Sha256>::new(Some(HKDF_SALT), &dh);
        let mut okm = [0u8; SESSION_KEY_LEN];
        let expanded = hkdf.expand(HKDF_INFO, &mut okm);
        dh.zeroize();
        expanded.map_err(|e| TesseraError::crypto(format!("HKDF expansion failed: {e}")))?;

        Ok(SessionSharedSecret(okm))
    }
}

impl fmt::Debug for SessionStaticSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionStaticSecret")
            .field(&"<redacted>")
            .finish()
    }
}

/// Public half of a session key pair.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionPublicKey([u8; SESSION_KEY_LEN]);

impl SessionPublicKey {
    /// Wrap raw public key bytes.
    pub fn from_bytes(bytes: [u8; SESSION_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw public key bytes.
    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SessionPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionPublicKey({})", hex::encode(self.0))
    }
}

/// Symmetric key shared between the requester and one participant.
///
/// Scoped to one ephemeral key pair and zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionSharedSecret([u8; SESSION_KEY_LEN]);

impl SessionSharedSecret {
    /// Key bytes for the envelope cipher.
    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SessionSharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionSharedSecret")
            .field(&"<redacted>")
            .finish()
    }
}

impl PartialEq for SessionSharedSecret {
    fn eq(&self, other: &Self) -> bool {
        // Constant-time comparison over fixed-length keys
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl Eq for SessionSharedSecret {}
