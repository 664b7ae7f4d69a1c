//! In-process participant transport with scripted misbehaviour.

use crate::fixtures::FixtureMember;
use crate::mock_effects::MockEffects;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tessera_core::{
    Address, DecryptionResponse, DecryptionService, DecryptionShareEffects,
    EncryptedDecryptionRequest, EncryptedDecryptionResponse, NodeTransport, RandomEffects, Result,
    RitualId, SealedEnvelope, TesseraError,
};
use tessera_effects::RistrettoShareHandler;
use tracing::trace;

/// How a participant behaves when reached through [`LocalNodeTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeBehavior {
    /// Forward to the service
    Honest,
    /// Fail with a network error without reaching the service
    Offline,
    /// Answer with bytes that do not open under any secret
    Garbage,
    /// Forward after sleeping
    Delayed(Duration),
}

/// Routes requests to in-process services by address.
#[derive(Clone, Default)]
pub struct LocalNodeTransport {
    nodes: BTreeMap<Address, (Arc<dyn DecryptionService>, NodeBehavior)>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl LocalNodeTransport {
    /// Transport with no nodes
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node under its own address
    pub fn with_node(mut self, service: Arc<dyn DecryptionService>, behavior: NodeBehavior) -> Self {
        self.nodes.insert(service.address().clone(), (service, behavior));
        self
    }

    /// Requests sent so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of requests that were in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl NodeTransport for LocalNodeTransport {
    async fn send(
        &self,
        node: &Address,
        request: EncryptedDecryptionRequest,
    ) -> Result<EncryptedDecryptionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let (service, behavior) = self
            .nodes
            .get(node)
            .ok_or_else(|| TesseraError::network(format!("Unknown participant {node}")))?;
        trace!(%node, ?behavior, "Local transport delivering request");

        match behavior {
            NodeBehavior::Honest => service.handle(request).await,
            NodeBehavior::Offline => Err(TesseraError::network("Participant offline")),
            NodeBehavior::Garbage => Ok(EncryptedDecryptionResponse {
                envelope: SealedEnvelope {
                    nonce: [0; 12],
                    ciphertext: vec![0xde, 0xad, 0xbe, 0xef],
                },
            }),
            NodeBehavior::Delayed(delay) => {
                tokio::time::sleep(*delay).await;
                service.handle(request).await
            }
        }
    }
}

/// A genuine ritual member that labels its responses with another ritual id.
///
/// The share itself is valid, so only the ritual id check can exclude it.
pub struct WrongRitualNode {
    member: FixtureMember,
    reported_ritual: RitualId,
    random: MockEffects,
}

impl WrongRitualNode {
    /// Answer as `member`, claiming `reported_ritual`
    pub fn new(member: FixtureMember, reported_ritual: RitualId) -> Self {
        Self {
            member,
            reported_ritual,
            random: MockEffects::deterministic(),
        }
    }
}

#[async_trait]
impl DecryptionService for WrongRitualNode {
    fn address(&self) -> &Address {
        &self.member.address
    }

    async fn handle(
        &self,
        request: EncryptedDecryptionRequest,
    ) -> Result<EncryptedDecryptionResponse> {
        let secret = self
            .member
            .session_secret
            .derive_shared_secret(&request.requester_public_key)?;
        let plain = request.decrypt(&secret)?;
        let aad = plain.acp.authenticated_data.aad()?;
        let share = RistrettoShareHandler::new(self.member.key_share.clone())
            .create_share(&plain.ciphertext_header, &aad)
            .await?;
        DecryptionResponse {
            ritual_id: self.reported_ritual,
            decryption_share: share,
        }
        .encrypt(&secret, &self.member.address, self.random.random_nonce())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    struct Unreachable(Address);

    #[async_trait]
    impl DecryptionService for Unreachable {
        fn address(&self) -> &Address {
            &self.0
        }

        async fn handle(
            &self,
            _request: EncryptedDecryptionRequest,
        ) -> Result<EncryptedDecryptionResponse> {
            Err(TesseraError::internal("service reached"))
        }
    }

    fn request() -> EncryptedDecryptionRequest {
        EncryptedDecryptionRequest {
            ritual_id: RitualId::new(1),
            requester_public_key: tessera_core::SessionPublicKey::from_bytes([9; 32]),
            envelope: SealedEnvelope {
                nonce: [0; 12],
                ciphertext: vec![],
            },
        }
    }

    #[tokio::test]
    async fn test_behaviours_route_as_scripted() {
        let online = Address::from_bytes([1; 20]);
        let offline = Address::from_bytes([2; 20]);
        let transport = LocalNodeTransport::new()
            .with_node(Arc::new(Unreachable(online.clone())), NodeBehavior::Honest)
            .with_node(Arc::new(Unreachable(offline.clone())), NodeBehavior::Offline);

        assert_matches!(
            transport.send(&online, request()).await,
            Err(TesseraError::Internal { .. })
        );
        assert_matches!(
            transport.send(&offline, request()).await,
            Err(TesseraError::Network { .. })
        );
        assert_matches!(
            transport.send(&Address::from_bytes([3; 20]), request()).await,
            Err(TesseraError::Network { .. })
        );
        assert_eq!(transport.calls(), 3);
        assert_eq!(transport.max_in_flight(), 1);
    }
}
