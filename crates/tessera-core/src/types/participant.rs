//! Participants of a decryption ritual and the ritual's public parameters.

use crate::crypto::hash::hasher;
use crate::crypto::session::SessionPublicKey;
use crate::identifiers::{Address, RitualId};
use serde::{Deserialize, Serialize};

/// Public key a ritual encrypts under. Opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DkgPublicKey(pub Vec<u8>);

impl DkgPublicKey {
    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// One node of a ritual.
///
/// Read-only to the decryption protocol and fetched fresh for every attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable node identity
    pub address: Address,
    /// Static key used for per-attempt session key agreement
    pub session_public_key: SessionPublicKey,
    /// Transcript this node contributed to the ritual's key generation
    pub transcript: Option<Vec<u8>>,
}

impl Participant {
    /// Create a participant without transcript material.
    pub fn new(address: Address, session_public_key: SessionPublicKey) -> Self {
        Self {
            address,
            session_public_key,
            transcript: None,
        }
    }

    /// Attach transcript material.
    pub fn with_transcript(mut self, transcript: Vec<u8>) -> Self {
        self.transcript = Some(transcript);
        self
    }
}

/// Public metadata of a ritual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ritual {
    /// Ritual identifier
    pub id: RitualId,
    /// Number of participants the ritual was created with
    pub dkg_size: usize,
    /// Shares required to decrypt
    pub threshold: usize,
    /// Key ciphertexts for this ritual are produced under
    pub public_key: DkgPublicKey,
    /// Digest over the ordered participant transcripts, when published
    pub aggregated_transcript_digest: Option<[u8; 32]>,
}

impl Ritual {
    /// Digest binding an ordered list of participant transcripts.
    pub fn transcript_digest<'a, I>(transcripts: I) -> [u8; 32]
    where
        I: IntoIterator<Item = (&'a Address, &'a [u8])>,
    {
        let mut h = hasher();
        h.update(b"tessera-ritual-transcripts-v1");
        for (address, transcript) in transcripts {
            h.update(address.as_str().as_bytes());
            h.update(&(transcript.len() as u64).to_be_bytes());
            h.update(transcript);
        }
        h.finalize()
    }
}
