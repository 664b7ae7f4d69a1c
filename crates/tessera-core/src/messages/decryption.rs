//! Decryption request and response, plain and sealed.

use crate::crypto::envelope::{SealedEnvelope, NONCE_LEN};
use crate::crypto::session::{SessionPublicKey, SessionSharedSecret};
use crate::errors::Result;
use crate::identifiers::{Address, RitualId};
use crate::messages::kit::{AccessControlPolicy, CiphertextHeader, Context};
use serde::{Deserialize, Serialize};

/// Partial decryption material from one participant. Opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionShare(pub Vec<u8>);

impl DecryptionShare {
    /// Raw share bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Plaintext request sent to one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionRequest {
    /// Ritual the requester wants shares from
    pub ritual_id: RitualId,
    /// Header of the ciphertext being decrypted
    pub ciphertext_header: CiphertextHeader,
    /// Policy attached to the ciphertext
    pub acp: AccessControlPolicy,
    /// Resolved condition context
    pub context: Option<Context>,
}

impl DecryptionRequest {
    /// Seal under a participant's shared secret, tagged with the requester's
    /// ephemeral public key.
    pub fn encrypt(
        &self,
        secret: &SessionSharedSecret,
        requester_public_key: SessionPublicKey,
        nonce: [u8; NONCE_LEN],
    ) -> Result<EncryptedDecryptionRequest> {
        let plaintext = bincode::serialize(self)?;
        let aad = request_aad(self.ritual_id, &requester_public_key);
        let envelope = SealedEnvelope::seal(secret, nonce, &plaintext, &aad)?;
        Ok(EncryptedDecryptionRequest {
            ritual_id: self.ritual_id,
            requester_public_key,
            envelope,
        })
    }
}

/// Sealed request as carried by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedDecryptionRequest {
    /// Ritual in the clear so a node can route before decrypting
    pub ritual_id: RitualId,
    /// Ephemeral key the node agrees a shared secret with
    pub requester_public_key: SessionPublicKey,
    /// Sealed [`DecryptionRequest`]
    pub envelope: SealedEnvelope,
}

impl EncryptedDecryptionRequest {
    /// Open with the shared secret the node derived.
    pub fn decrypt(&self, secret: &SessionSharedSecret) -> Result<DecryptionRequest> {
        let aad = request_aad(self.ritual_id, &self.requester_public_key);
        let plaintext = self.envelope.open(secret, &aad)?;
        Ok(bincode::deserialize(&plaintext)?)
    }

    /// Serialize for transport.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize transport bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Plaintext response from one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionResponse {
    /// Ritual the share belongs to
    pub ritual_id: RitualId,
    /// Partial decryption share
    pub decryption_share: DecryptionShare,
}

impl DecryptionResponse {
    /// Seal under the shared secret of the request it answers, bound to the
    /// responding participant's address.
    pub fn encrypt(
        &self,
        secret: &SessionSharedSecret,
        participant: &Address,
        nonce: [u8; NONCE_LEN],
    ) -> Result<EncryptedDecryptionResponse> {
        let plaintext = bincode::serialize(self)?;
        let envelope =
            SealedEnvelope::seal(secret, nonce, &plaintext, &response_aad(participant))?;
        Ok(EncryptedDecryptionResponse { envelope })
    }
}

/// Sealed response as carried by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedDecryptionResponse {
    /// Sealed [`DecryptionResponse`]
    pub envelope: SealedEnvelope,
}

impl EncryptedDecryptionResponse {
    /// Open with the requester-side shared secret for `participant`.
    pub fn decrypt(
        &self,
        secret: &SessionSharedSecret,
        participant: &Address,
    ) -> Result<DecryptionResponse> {
        let plaintext = self.envelope.open(secret, &response_aad(participant))?;
        Ok(bincode::deserialize(&plaintext)?)
    }

    /// Serialize for transport.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize transport bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

const RESPONSE_LABEL: &[u8] = b"tessera-decryption-response-v1";

fn response_aad(participant: &Address) -> Vec<u8> {
    let mut aad = RESPONSE_LABEL.to_vec();
    aad.extend_from_slice(participant.as_str().as_bytes());
    aad
}

fn request_aad(ritual_id: RitualId, requester_public_key: &SessionPublicKey) -> Vec<u8> {
    let mut aad = Vec::with_capacity(4 + 32);
    aad.extend_from_slice(&ritual_id.value().to_be_bytes());
    aad.extend_from_slice(requester_public_key.as_bytes());
    aad
}
