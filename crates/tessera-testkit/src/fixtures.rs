//! Ritual fixtures: a dealt threshold key, its participants and their roster.

use crate::mock_effects::MockEffects;
use tessera_core::crypto::hash;
use tessera_core::{
    Address, DkgPublicKey, Participant, RandomEffects, Ritual, RitualId, SessionStaticSecret,
};
use tessera_effects::{generate_key_shares, KeyShare, StaticRoster};

/// Secret material of one fixture participant.
#[derive(Debug, Clone)]
pub struct FixtureMember {
    /// Participant address
    pub address: Address,
    /// Static session key the participant agrees request secrets with
    pub session_secret: SessionStaticSecret,
    /// The participant's share of the ritual key
    pub key_share: KeyShare,
    /// Public roster entry
    pub participant: Participant,
}

/// A complete ritual dealt from a seed.
#[derive(Debug, Clone)]
pub struct RitualFixture {
    /// Public ritual metadata
    pub ritual: Ritual,
    /// Members in roster order
    pub members: Vec<FixtureMember>,
}

impl RitualFixture {
    /// Deal a ritual with id 1.
    pub fn new(threshold: usize, shares: usize, seed: [u8; 32]) -> Self {
        Self::with_id(RitualId::new(1), threshold, shares, seed)
    }

    /// Deal a ritual with an explicit id.
    pub fn with_id(ritual_id: RitualId, threshold: usize, shares: usize, seed: [u8; 32]) -> Self {
        let random = MockEffects::with_seed(seed);
        let (public_key, key_shares) = generate_key_shares(threshold, shares, &random).unwrap();

        let members: Vec<FixtureMember> = key_shares
            .into_iter()
            .map(|key_share| {
                let session_secret = SessionStaticSecret::from_bytes(random.random_bytes_32());
                let address =
                    Address::from_public_key(session_secret.public_key().as_bytes());
                let transcript = hash(&[address.as_str().as_bytes(), &public_key.0].concat());
                let participant = Participant::new(address.clone(), session_secret.public_key())
                    .with_transcript(transcript.to_vec());
                FixtureMember {
                    address,
                    session_secret,
                    key_share,
                    participant,
                }
            })
            .collect();

        let digest = Ritual::transcript_digest(members.iter().map(|m| {
            (
                &m.address,
                m.participant.transcript.as_deref().unwrap_or_default(),
            )
        }));
        let ritual = Ritual {
            id: ritual_id,
            dkg_size: shares,
            threshold,
            public_key,
            aggregated_transcript_digest: Some(digest),
        };
        Self { ritual, members }
    }

    /// Ritual public key
    pub fn public_key(&self) -> &DkgPublicKey {
        &self.ritual.public_key
    }

    /// Public roster entries in order
    pub fn participants(&self) -> Vec<Participant> {
        self.members.iter().map(|m| m.participant.clone()).collect()
    }

    /// Roster holding this ritual
    pub fn roster(&self) -> StaticRoster {
        StaticRoster::new().with_ritual(self.ritual.clone(), self.participants())
    }
}
