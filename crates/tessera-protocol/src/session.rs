//! Per-attempt session negotiation
//!
//! One ephemeral key pair per decryption attempt; one shared secret per
//! participant agreed against that participant's static key. The ephemeral
//! secret is dropped (and zeroized) as soon as the secrets are derived.

use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_core::{
    Address, Participant, ParticipantError, RandomEffects, SessionPublicKey, SessionSharedSecret,
    SessionStaticSecret,
};
use tracing::{debug, warn};

/// Source of ephemeral session keys.
pub trait SessionKeyFactory: Send + Sync {
    /// A fresh key that has never been handed out before
    fn ephemeral_key(&self) -> SessionStaticSecret;
}

/// Ephemeral keys drawn from a randomness effect.
#[derive(Debug, Clone)]
pub struct RandomSessionKeyFactory<R: RandomEffects> {
    random: R,
}

impl<R: RandomEffects> RandomSessionKeyFactory<R> {
    /// Factory over `random`
    pub fn new(random: R) -> Self {
        Self { random }
    }
}

impl<R: RandomEffects> SessionKeyFactory for RandomSessionKeyFactory<R> {
    fn ephemeral_key(&self) -> SessionStaticSecret {
        SessionStaticSecret::from_bytes(self.random.random_bytes_32())
    }
}

/// Shared secrets for one decryption attempt.
///
/// Never cloned; secrets are zeroized when the session is dropped.
#[derive(Debug)]
pub struct Session {
    public_key: SessionPublicKey,
    secrets: BTreeMap<Address, SessionSharedSecret>,
    rejected: BTreeMap<Address, ParticipantError>,
}

impl Session {
    /// Ephemeral public key requests are tagged with
    pub fn public_key(&self) -> SessionPublicKey {
        self.public_key
    }

    /// Secret agreed with `participant`
    pub fn secret_for(&self, participant: &Address) -> Option<&SessionSharedSecret> {
        self.secrets.get(participant)
    }

    /// Participants a secret was agreed with, in address order
    pub fn participants(&self) -> impl Iterator<Item = &Address> {
        self.secrets.keys()
    }

    /// Participants whose static key could not be used
    pub fn rejected(&self) -> &BTreeMap<Address, ParticipantError> {
        &self.rejected
    }
}

/// Derives a [`Session`] for a roster.
pub struct SessionNegotiator {
    keys: Arc<dyn SessionKeyFactory>,
}

impl SessionNegotiator {
    /// Negotiator drawing ephemeral keys from `keys`
    pub fn new(keys: Arc<dyn SessionKeyFactory>) -> Self {
        Self { keys }
    }

    /// Agree a secret with every participant under one fresh ephemeral key.
    ///
    /// A participant whose static key yields a degenerate agreement is
    /// recorded in [`Session::rejected`] instead of failing the attempt.
    pub fn negotiate(&self, participants: &[Participant]) -> Session {
        let ephemeral = self.keys.ephemeral_key();
        let mut secrets = BTreeMap::new();
        let mut rejected = BTreeMap::new();

        for participant in participants {
            match ephemeral.derive_shared_secret(&participant.session_public_key) {
                Ok(secret) => {
                    secrets.insert(participant.address.clone(), secret);
                }
                Err(err) => {
                    warn!(
                        participant = %participant.address,
                        error = %err,
                        "Session key agreement failed"
                    );
                    rejected.insert(
                        participant.address.clone(),
                        ParticipantError::decode(err.to_string()),
                    );
                }
            }
        }

        debug!(
            participants = secrets.len(),
            rejected = rejected.len(),
            "Negotiated session secrets"
        );
        Session {
            public_key: ephemeral.public_key(),
            secrets,
            rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_testkit::{MockEffects, RitualFixture};

    fn negotiator(seed: [u8; 32]) -> SessionNegotiator {
        SessionNegotiator::new(Arc::new(RandomSessionKeyFactory::new(
            MockEffects::with_seed(seed),
        )))
    }

    #[test]
    fn test_participant_recomputes_same_secret() {
        let fixture = RitualFixture::new(2, 3, [1; 32]);
        let session = negotiator([2; 32]).negotiate(&fixture.participants());

        for member in &fixture.members {
            let node_side = member
                .session_secret
                .derive_shared_secret(&session.public_key())
                .unwrap();
            assert_eq!(session.secret_for(&member.address), Some(&node_side));
        }
    }

    #[test]
    fn test_each_attempt_uses_fresh_ephemeral_key() {
        let fixture = RitualFixture::new(2, 3, [1; 32]);
        let negotiator = negotiator([2; 32]);
        let first = negotiator.negotiate(&fixture.participants());
        let second = negotiator.negotiate(&fixture.participants());
        assert_ne!(first.public_key(), second.public_key());
    }

    #[test]
    fn test_degenerate_participant_key_is_isolated() {
        let fixture = RitualFixture::new(2, 3, [1; 32]);
        let mut participants = fixture.participants();
        participants[0].session_public_key = SessionPublicKey::from_bytes([0; 32]);

        let session = negotiator([2; 32]).negotiate(&participants);
        assert_eq!(session.participants().count(), 2);
        assert!(session.rejected().contains_key(&participants[0].address));
    }
}
