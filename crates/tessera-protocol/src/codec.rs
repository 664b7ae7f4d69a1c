//! Request/response codec
//!
//! Seals one request per participant under that participant's session secret
//! and opens responses back into `(ritual id, share)` pairs. Decode failures
//! are [`ParticipantError`]s so one bad payload never aborts the others.

use crate::session::Session;
use std::collections::BTreeMap;
use tessera_core::{
    Address, DecryptionRequest, DecryptionResponse, EncryptedDecryptionRequest,
    EncryptedDecryptionResponse, ParticipantError, RandomEffects, Result,
};
use tracing::trace;

/// Builds sealed requests and opens sealed responses for one session.
pub struct RequestCodec<'a, R: RandomEffects> {
    session: &'a Session,
    random: &'a R,
}

impl<'a, R: RandomEffects> RequestCodec<'a, R> {
    /// Codec over a negotiated session, drawing envelope nonces from `random`
    pub fn new(session: &'a Session, random: &'a R) -> Self {
        Self { session, random }
    }

    /// One sealed copy of `request` per participant of the session.
    pub fn encode(
        &self,
        request: &DecryptionRequest,
    ) -> Result<BTreeMap<Address, EncryptedDecryptionRequest>> {
        let mut sealed = BTreeMap::new();
        for participant in self.session.participants() {
            // participants() only yields addresses with a secret
            if let Some(secret) = self.session.secret_for(participant) {
                let nonce = self.random.random_nonce();
                let encrypted = request.encrypt(secret, self.session.public_key(), nonce)?;
                sealed.insert(participant.clone(), encrypted);
            }
        }
        trace!(
            requests = sealed.len(),
            ritual = %request.ritual_id,
            "Encoded decryption requests"
        );
        Ok(sealed)
    }

    /// Open the response `participant` sent.
    pub fn decode(
        &self,
        participant: &Address,
        response: &EncryptedDecryptionResponse,
    ) -> std::result::Result<DecryptionResponse, ParticipantError> {
        let secret = self.session.secret_for(participant).ok_or_else(|| {
            ParticipantError::decode(format!("No session secret for participant {participant}"))
        })?;
        response
            .decrypt(secret, participant)
            .map_err(|e| ParticipantError::decode(e.to_string()))
    }
}
