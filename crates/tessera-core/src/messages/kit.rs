//! Encrypted message kit and its access control policy.

use crate::crypto::hash::hasher;
use crate::errors::Result;
use crate::types::DkgPublicKey;
use serde::{Deserialize, Serialize};

/// Serialized condition expression attached to a ciphertext.
///
/// Opaque JSON text at this layer; the condition engine owns its structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions(pub String);

impl Conditions {
    /// JSON text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Serialized, fully resolved condition context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context(pub String);

impl Context {
    /// JSON text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Header of a threshold ciphertext; the part participants decrypt against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiphertextHeader(pub Vec<u8>);

impl CiphertextHeader {
    /// Raw header bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Digest the encryptor's authorization signature is computed over.
    ///
    /// Covers the header and the associated data, so the signature also pins
    /// the ritual key and conditions.
    pub fn digest(&self, aad: &[u8]) -> [u8; 32] {
        let len = u64::try_from(self.0.len()).unwrap_or(u64::MAX);
        let mut h = hasher();
        h.update(b"tessera-authorization-v1")
            .update(&len.to_be_bytes())
            .update(&self.0)
            .update(aad);
        h.finalize()
    }
}

/// Threshold ciphertext produced by the encryption primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    /// Header consumed by participants
    pub header: CiphertextHeader,
    /// Symmetrically encrypted payload
    pub payload: Vec<u8>,
}

/// Data bound into the ciphertext as associated data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedData {
    /// Ritual key the message was encrypted under
    pub public_key: DkgPublicKey,
    /// Access conditions, if any
    pub conditions: Option<Conditions>,
}

impl AuthenticatedData {
    /// Canonical bytes used as AEAD associated data.
    pub fn aad(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }
}

/// Access control policy travelling with a ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlPolicy {
    /// Key and conditions bound to the ciphertext
    pub authenticated_data: AuthenticatedData,
    /// Encryptor's signature over the header digest of header and associated data
    pub authorization: Vec<u8>,
    /// Encryptor's verifying key
    pub authorizer_public_key: Vec<u8>,
}

impl AccessControlPolicy {
    /// Conditions attached to the ciphertext.
    pub fn conditions(&self) -> Option<&Conditions> {
        self.authenticated_data.conditions.as_ref()
    }
}

/// Everything a requester needs to ask a ritual for decryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdMessageKit {
    /// Threshold ciphertext
    pub ciphertext: Ciphertext,
    /// Access control policy
    pub acp: AccessControlPolicy,
}

impl ThresholdMessageKit {
    /// Ciphertext header.
    pub fn ciphertext_header(&self) -> &CiphertextHeader {
        &self.ciphertext.header
    }

    /// Serialize for storage or transport.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from [`to_bytes`](Self::to_bytes) output.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
