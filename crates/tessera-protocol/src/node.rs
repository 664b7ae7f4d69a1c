//! Participant side of a decryption request.

use async_trait::async_trait;
use std::sync::Arc;
use tessera_conditions::{
    ConditionContext, ConditionEvaluator, ConditionExpression, EvaluationEffects,
};
use tessera_core::crypto::ed25519_verify;
use tessera_core::{
    Address, DecryptionRequest, DecryptionResponse, DecryptionService, DecryptionShareEffects,
    DkgPublicKey, EncryptedDecryptionRequest, EncryptedDecryptionResponse, NodeConfig,
    RandomEffects, Result, Ritual, RitualId, SessionStaticSecret, TesseraError,
};
use tracing::{debug, info, warn};

/// Effects a decryption node needs.
pub trait NodeEffects: EvaluationEffects + RandomEffects {}

impl<T> NodeEffects for T where T: EvaluationEffects + RandomEffects {}

/// One ritual participant answering decryption requests.
pub struct DecryptionNode<E: NodeEffects> {
    address: Address,
    session_secret: SessionStaticSecret,
    ritual_id: RitualId,
    public_key: DkgPublicKey,
    share: Arc<dyn DecryptionShareEffects>,
    evaluator: ConditionEvaluator<E>,
    effects: Arc<E>,
}

impl<E: NodeEffects> DecryptionNode<E> {
    /// Node for `ritual` holding its static session key and key share.
    pub fn new(
        address: Address,
        session_secret: SessionStaticSecret,
        ritual: &Ritual,
        share: Arc<dyn DecryptionShareEffects>,
        effects: Arc<E>,
        config: &NodeConfig,
    ) -> Self {
        Self {
            address,
            session_secret,
            ritual_id: ritual.id,
            public_key: ritual.public_key.clone(),
            share,
            evaluator: ConditionEvaluator::new(effects.clone(), config),
            effects,
        }
    }

    /// Check the request and return the associated data the share is bound to.
    async fn authorize(&self, request: &DecryptionRequest) -> Result<Vec<u8>> {
        let acp = &request.acp;
        if acp.authenticated_data.public_key != self.public_key {
            return Err(TesseraError::invalid(
                "Ciphertext was not encrypted to this ritual's key",
            ));
        }
        let aad = acp.authenticated_data.aad()?;
        let digest = request.ciphertext_header.digest(&aad);
        if !ed25519_verify(&acp.authorizer_public_key, &digest, &acp.authorization)? {
            return Err(TesseraError::invalid(
                "Authorization does not match ciphertext header",
            ));
        }

        if let Some(conditions) = acp.conditions() {
            let expression = ConditionExpression::from_conditions(conditions)?;
            let context = match &request.context {
                Some(context) => ConditionContext::from_context(context)?,
                None => ConditionContext::new(),
            };
            if !self.evaluator.evaluate(&expression, &context).await? {
                return Err(TesseraError::invalid("Decryption conditions not satisfied"));
            }
        }
        Ok(aad)
    }
}

#[async_trait]
impl<E: NodeEffects> DecryptionService for DecryptionNode<E> {
    fn address(&self) -> &Address {
        &self.address
    }

    async fn handle(
        &self,
        request: EncryptedDecryptionRequest,
    ) -> Result<EncryptedDecryptionResponse> {
        if request.ritual_id != self.ritual_id {
            warn!(
                node = %self.address,
                ritual = %request.ritual_id,
                "Request for unknown ritual"
            );
            return Err(TesseraError::invalid(format!(
                "Node does not participate in ritual {}",
                request.ritual_id
            )));
        }

        let secret = self
            .session_secret
            .derive_shared_secret(&request.requester_public_key)?;
        let plain = request.decrypt(&secret)?;
        let aad = match self.authorize(&plain).await {
            Ok(aad) => aad,
            Err(err) => {
                info!(node = %self.address, error = %err, "Decryption request denied");
                return Err(err);
            }
        };

        let decryption_share = self
            .share
            .create_share(&plain.ciphertext_header, &aad)
            .await?;
        debug!(node = %self.address, ritual = %self.ritual_id, "Issued decryption share");
        DecryptionResponse {
            ritual_id: self.ritual_id,
            decryption_share,
        }
        .encrypt(&secret, &self.address, self.effects.random_nonce())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::encrypt_message;
    use assert_matches::assert_matches;
    use tessera_conditions::{Comparator, ReturnValueTest, TimeCondition};
    use tessera_core::{ChainId, ThresholdMessageKit};
    use tessera_effects::{Ed25519AuthSigner, RistrettoShareHandler, RistrettoThresholdHandler};
    use tessera_testkit::{MockEffects, RitualFixture};

    struct Harness {
        fixture: RitualFixture,
        effects: Arc<MockEffects>,
        node: DecryptionNode<MockEffects>,
        requester: SessionStaticSecret,
    }

    fn harness() -> Harness {
        let fixture = RitualFixture::new(2, 3, [1; 32]);
        let effects = Arc::new(MockEffects::deterministic());
        let member = fixture.members[0].clone();
        let node = DecryptionNode::new(
            member.address,
            member.session_secret,
            &fixture.ritual,
            Arc::new(RistrettoShareHandler::new(member.key_share)),
            effects.clone(),
            &NodeConfig::default(),
        );
        Harness {
            fixture,
            effects,
            node,
            requester: SessionStaticSecret::from_bytes([8; 32]),
        }
    }

    async fn kit(fixture: &RitualFixture, not_before: u64) -> ThresholdMessageKit {
        let expression = ConditionExpression::new(TimeCondition::new(
            ChainId::Polygon,
            ReturnValueTest::new(Comparator::GreaterOrEqual, not_before),
        ));
        encrypt_message(
            &RistrettoThresholdHandler::new(MockEffects::with_seed([2; 32])),
            b"payload",
            fixture.public_key(),
            Some(&expression),
            &Ed25519AuthSigner::from_seed([3; 32]),
        )
        .await
        .unwrap()
    }

    fn seal(
        h: &Harness,
        kit: &ThresholdMessageKit,
        ritual_id: RitualId,
    ) -> EncryptedDecryptionRequest {
        let secret = h
            .requester
            .derive_shared_secret(&h.fixture.members[0].participant.session_public_key)
            .unwrap();
        DecryptionRequest {
            ritual_id,
            ciphertext_header: kit.ciphertext.header.clone(),
            acp: kit.acp.clone(),
            context: None,
        }
        .encrypt(&secret, h.requester.public_key(), [5; 12])
        .unwrap()
    }

    #[tokio::test]
    async fn test_satisfied_request_gets_share() {
        let h = harness();
        h.effects.set_block_timestamp(ChainId::Polygon, 1_000);
        let kit = kit(&h.fixture, 500).await;

        let request = seal(&h, &kit, h.fixture.ritual.id);
        let sealed = h.node.handle(request).await.unwrap();
        let secret = h
            .requester
            .derive_shared_secret(&h.fixture.members[0].participant.session_public_key)
            .unwrap();
        let response = sealed.decrypt(&secret, h.node.address()).unwrap();
        assert_eq!(response.ritual_id, h.fixture.ritual.id);
        assert!(!response.decryption_share.as_bytes().is_empty());
    }

    #[tokio::test]
    async fn test_unsatisfied_conditions_denied() {
        let h = harness();
        h.effects.set_block_timestamp(ChainId::Polygon, 100);
        let kit = kit(&h.fixture, 500).await;
        assert_matches!(
            h.node.handle(seal(&h, &kit, h.fixture.ritual.id)).await,
            Err(TesseraError::Invalid { message }) if message.contains("not satisfied")
        );
    }

    #[tokio::test]
    async fn test_forged_authorization_denied() {
        let h = harness();
        let mut kit = kit(&h.fixture, 0).await;
        kit.acp.authorization[0] ^= 0x01;
        assert_matches!(
            h.node.handle(seal(&h, &kit, h.fixture.ritual.id)).await,
            Err(TesseraError::Invalid { message }) if message.contains("Authorization")
        );
    }

    #[tokio::test]
    async fn test_other_ritual_refused() {
        let h = harness();
        let kit = kit(&h.fixture, 0).await;
        assert_matches!(
            h.node.handle(seal(&h, &kit, RitualId::new(2))).await,
            Err(TesseraError::Invalid { message }) if message.contains("ritual 2")
        );
    }
}
