//! Requester-side threshold decryption
//!
//! Directory → session → context → codec (fan-out via the relay) →
//! aggregator (fan-in) → combination. Responses are decoded and counted as
//! they arrive, and the relay stops as soon as the aggregator leaves
//! `Collecting`. Every attempt negotiates its own session and owns its own
//! aggregator; nothing is shared between attempts.

use crate::aggregator::{QuorumAggregator, QuorumState, RetrievalResult};
use crate::codec::RequestCodec;
use crate::directory::ParticipantDirectory;
use crate::session::{RandomSessionKeyFactory, SessionKeyFactory, SessionNegotiator};
use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_conditions::{
    ConditionExpression, ContextResolver, ContextValueSource, ResolverEffects,
};
use tessera_core::{
    Address, AuthSignerEffects, Context, DecryptionRequest, EncryptedDecryptionResponse,
    ParticipantError, RandomEffects, RelayEffects, RelaySink, Result, RitualId, RosterEffects,
    ThresholdCryptoEffects, ThresholdMessageKit,
};
use tracing::{debug, info};

/// Caller-side inputs for one decryption attempt.
#[derive(Default)]
pub struct RequesterContext<'a> {
    /// Values for custom context parameters
    pub custom: BTreeMap<String, ContextValueSource>,
    /// Signer backing the requester address parameter
    pub signer: Option<&'a dyn AuthSignerEffects>,
}

impl<'a> RequesterContext<'a> {
    /// Context with only a requester signer
    pub fn with_signer(signer: &'a dyn AuthSignerEffects) -> Self {
        Self {
            custom: BTreeMap::new(),
            signer: Some(signer),
        }
    }

    /// Add a custom parameter value
    pub fn param(
        mut self,
        name: impl Into<String>,
        source: impl Into<ContextValueSource>,
    ) -> Self {
        self.custom.insert(name.into(), source.into());
        self
    }
}

/// Retrieves decryption shares from a ritual and decrypts message kits.
pub struct ThresholdDecryptionClient<E: ResolverEffects + 'static> {
    effects: Arc<E>,
    directory: ParticipantDirectory,
    negotiator: SessionNegotiator,
    resolver: ContextResolver<E>,
    relay: Arc<dyn RelayEffects>,
    crypto: Arc<dyn ThresholdCryptoEffects>,
}

impl<E: ResolverEffects + 'static> ThresholdDecryptionClient<E> {
    /// Client drawing ephemeral session keys from `effects`.
    pub fn new(
        effects: Arc<E>,
        roster: Arc<dyn RosterEffects>,
        relay: Arc<dyn RelayEffects>,
        crypto: Arc<dyn ThresholdCryptoEffects>,
    ) -> Self {
        let keys = Arc::new(RandomSessionKeyFactory::new(effects.clone()));
        Self {
            directory: ParticipantDirectory::new(roster),
            negotiator: SessionNegotiator::new(keys),
            resolver: ContextResolver::new(effects.clone()),
            effects,
            relay,
            crypto,
        }
    }

    /// Replace the ephemeral key source
    pub fn with_session_keys(mut self, keys: Arc<dyn SessionKeyFactory>) -> Self {
        self.negotiator = SessionNegotiator::new(keys);
        self
    }

    /// Collect at least a threshold of shares for `kit` from `ritual_id`.
    ///
    /// Per-participant failures only shrink the pool; the attempt fails with
    /// [`TesseraError::QuorumNotMet`](tessera_core::TesseraError::QuorumNotMet)
    /// when fewer than the ritual's threshold of valid shares arrive.
    pub async fn retrieve(
        &self,
        kit: &ThresholdMessageKit,
        ritual_id: RitualId,
        requester: &RequesterContext<'_>,
    ) -> Result<RetrievalResult> {
        let roster = self.directory.fetch(ritual_id).await?;
        let context = self.resolve_context(kit, requester).await?;

        let session = self.negotiator.negotiate(&roster.participants);
        let codec = RequestCodec::new(&session, self.effects.as_ref());
        let request = DecryptionRequest {
            ritual_id,
            ciphertext_header: kit.ciphertext_header().clone(),
            acp: kit.acp.clone(),
            context,
        };
        let requests = codec.encode(&request)?;

        let mut aggregator = QuorumAggregator::new(
            ritual_id,
            roster.ritual.threshold,
            roster.participants.iter().map(|p| &p.address),
        );
        for (participant, error) in session.rejected() {
            aggregator.record_error(participant, error.clone());
        }

        let mut sink = QuorumSink {
            codec: &codec,
            aggregator: &mut aggregator,
        };
        self.relay.collect(requests, &mut sink).await?;
        debug!(
            ritual = %ritual_id,
            shares = aggregator.share_count(),
            state = ?aggregator.state(),
            "Relay round complete"
        );
        aggregator.finish()
    }

    /// Retrieve shares, combine them and decrypt `kit`.
    pub async fn retrieve_and_decrypt(
        &self,
        kit: &ThresholdMessageKit,
        ritual_id: RitualId,
        requester: &RequesterContext<'_>,
    ) -> Result<Vec<u8>> {
        let result = self.retrieve(kit, ritual_id, requester).await?;
        let shared_secret = self
            .crypto
            .combine_shares(&result.decryption_shares())
            .await?;
        let aad = kit.acp.authenticated_data.aad()?;
        let plaintext = self.crypto.decrypt(&kit.ciphertext, &shared_secret, &aad).await?;
        info!(
            ritual = %ritual_id,
            shares = result.shares.len(),
            "Decrypted message kit"
        );
        Ok(plaintext)
    }

    async fn resolve_context(
        &self,
        kit: &ThresholdMessageKit,
        requester: &RequesterContext<'_>,
    ) -> Result<Option<Context>> {
        let Some(conditions) = kit.acp.conditions() else {
            return Ok(None);
        };
        let expression = ConditionExpression::from_conditions(conditions)?;
        let context = self
            .resolver
            .resolve(&expression, &requester.custom, requester.signer)
            .await?;
        Ok(Some(context.to_context()?))
    }
}

/// Decodes relay outcomes into the aggregator as they arrive.
struct QuorumSink<'a, 'c, R: RandomEffects> {
    codec: &'a RequestCodec<'c, R>,
    aggregator: &'a mut QuorumAggregator,
}

impl<R: RandomEffects> RelaySink for QuorumSink<'_, '_, R> {
    fn record(
        &mut self,
        participant: Address,
        outcome: Result<EncryptedDecryptionResponse>,
    ) -> bool {
        let state = match outcome {
            Ok(response) => match self.codec.decode(&participant, &response) {
                Ok(decoded) => self.aggregator.record_response(&participant, decoded),
                Err(error) => self.aggregator.record_error(&participant, error),
            },
            Err(err) => self
                .aggregator
                .record_error(&participant, ParticipantError::transport(err.to_string())),
        };
        state != QuorumState::Collecting
    }
}
