//! End-to-end decryption against in-process ritual participants.

use assert_matches::assert_matches;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tessera_conditions::{erc721_ownership, Condition, ConditionExpression};
use tessera_core::{
    Address, AuthSignerEffects, ChainId, DecryptionService, NodeConfig, ParticipantError,
    RitualId, TesseraConfig, TesseraError, ThresholdMessageKit,
};
use tessera_effects::{Ed25519AuthSigner, RistrettoShareHandler, RistrettoThresholdHandler};
use tessera_protocol::{
    encrypt_message, DecryptionNode, FanoutRelay, RequesterContext, ThresholdDecryptionClient,
};
use tessera_testkit::{
    init_test_tracing, LocalNodeTransport, MockEffects, NodeBehavior, RitualFixture,
    WrongRitualNode,
};

const PLAINTEXT: &[u8] = b"the launch code is 0000";

/// Lets faster participants answer first.
const SLOW: NodeBehavior = NodeBehavior::Delayed(Duration::from_millis(50));

/// How each fixture member is wired into the transport.
#[derive(Clone, Copy)]
enum Member {
    Node(NodeBehavior),
    ClaimsRitual(u32),
}

struct Deployment {
    fixture: RitualFixture,
    effects: Arc<MockEffects>,
    client: ThresholdDecryptionClient<MockEffects>,
}

fn deploy(members: &[Member]) -> Deployment {
    init_test_tracing();
    let fixture = RitualFixture::new(2, members.len(), [11; 32]);
    let effects = Arc::new(MockEffects::deterministic());
    let config = TesseraConfig::from_toml_str(
        "[retrieval]\nrequest_timeout_ms = 2000\nmax_concurrent_requests = 3\n",
    )
    .unwrap();

    let mut transport = LocalNodeTransport::new();
    for (member, wiring) in fixture.members.iter().zip(members) {
        let (service, behavior): (Arc<dyn DecryptionService>, NodeBehavior) = match *wiring {
            Member::Node(behavior) => (
                Arc::new(DecryptionNode::new(
                    member.address.clone(),
                    member.session_secret.clone(),
                    &fixture.ritual,
                    Arc::new(RistrettoShareHandler::new(member.key_share.clone())),
                    effects.clone(),
                    &NodeConfig::default(),
                )),
                behavior,
            ),
            Member::ClaimsRitual(id) => (
                Arc::new(WrongRitualNode::new(member.clone(), RitualId::new(id))),
                NodeBehavior::Honest,
            ),
        };
        transport = transport.with_node(service, behavior);
    }

    let client = ThresholdDecryptionClient::new(
        effects.clone(),
        Arc::new(fixture.roster()),
        Arc::new(FanoutRelay::new(Arc::new(transport), &config.retrieval)),
        Arc::new(RistrettoThresholdHandler::new(MockEffects::with_seed([12; 32]))),
    );
    Deployment {
        fixture,
        effects,
        client,
    }
}

fn collections() -> (Address, Address) {
    (Address::from_bytes([0xa; 20]), Address::from_bytes([0xb; 20]))
}

/// `ownsNFT(collection A, token 1) OR ownsNFT(collection B, token 2)`
fn owns_either() -> ConditionExpression {
    let (a, b) = collections();
    ConditionExpression::new(
        Condition::from(erc721_ownership(a, ChainId::Sepolia, 1))
            .or(erc721_ownership(b, ChainId::Sepolia, 2).into()),
    )
}

/// Requester owns token 2 of collection B only.
fn script_ownership(effects: &MockEffects, requester: &Address) {
    let (a, b) = collections();
    effects.set_read_result(
        erc721_ownership(a, ChainId::Sepolia, 1).read_call(),
        json!(Address::from_bytes([1; 20]).as_str()),
    );
    effects.set_read_result(
        erc721_ownership(b, ChainId::Sepolia, 2).read_call(),
        json!(requester.as_str()),
    );
}

async fn encrypted_kit(deployment: &Deployment) -> ThresholdMessageKit {
    encrypt_message(
        &RistrettoThresholdHandler::new(MockEffects::with_seed([13; 32])),
        PLAINTEXT,
        deployment.fixture.public_key(),
        Some(&owns_either()),
        &Ed25519AuthSigner::from_seed([14; 32]),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_owner_of_either_nft_decrypts() {
    let d = deploy(&[Member::Node(NodeBehavior::Honest); 3]);
    let requester = Ed25519AuthSigner::from_seed([15; 32]);
    script_ownership(&d.effects, &requester.address());
    let kit = encrypted_kit(&d).await;
    let context = RequesterContext::with_signer(&requester);

    let plaintext = d
        .client
        .retrieve_and_decrypt(&kit, d.fixture.ritual.id, &context)
        .await
        .unwrap();
    assert_eq!(plaintext, PLAINTEXT);
}

#[tokio::test]
async fn test_non_owner_is_denied_by_every_node() {
    let d = deploy(&[Member::Node(NodeBehavior::Honest); 3]);
    let requester = Ed25519AuthSigner::from_seed([15; 32]);
    script_ownership(&d.effects, &Address::from_bytes([2; 20]));
    let kit = encrypted_kit(&d).await;
    let context = RequesterContext::with_signer(&requester);

    let err = d
        .client
        .retrieve(&kit, d.fixture.ritual.id, &context)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        TesseraError::QuorumNotMet { received: 0, ref errors, .. } if errors.len() == 3
    );
}

#[tokio::test]
async fn test_one_of_three_responding_misses_quorum() {
    let d = deploy(&[
        Member::Node(NodeBehavior::Honest),
        Member::Node(NodeBehavior::Offline),
        Member::Node(NodeBehavior::Garbage),
    ]);
    let requester = Ed25519AuthSigner::from_seed([15; 32]);
    script_ownership(&d.effects, &requester.address());
    let kit = encrypted_kit(&d).await;
    let context = RequesterContext::with_signer(&requester);

    let err = d
        .client
        .retrieve(&kit, d.fixture.ritual.id, &context)
        .await
        .unwrap_err();
    match err {
        TesseraError::QuorumNotMet {
            ritual_id,
            threshold,
            received,
            errors,
        } => {
            assert_eq!(ritual_id, d.fixture.ritual.id);
            assert_eq!((threshold, received), (2, 1));
            assert_eq!(errors.len(), 2);
            assert!(errors[&d.fixture.members[1].address].contains("offline"));
            assert!(errors[&d.fixture.members[2].address].starts_with("Decode error"));
        }
        other => panic!("expected QuorumNotMet, got {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_response_does_not_block_quorum() {
    let d = deploy(&[
        Member::Node(SLOW),
        Member::Node(NodeBehavior::Garbage),
        Member::Node(SLOW),
    ]);
    let requester = Ed25519AuthSigner::from_seed([15; 32]);
    script_ownership(&d.effects, &requester.address());
    let kit = encrypted_kit(&d).await;
    let context = RequesterContext::with_signer(&requester);

    let result = d
        .client
        .retrieve(&kit, d.fixture.ritual.id, &context)
        .await
        .unwrap();
    assert_eq!(result.shares.len(), 2);
    assert_matches!(
        result.errors.get(&d.fixture.members[1].address),
        Some(ParticipantError::Decode { .. })
    );

    let plaintext = d
        .client
        .retrieve_and_decrypt(&kit, d.fixture.ritual.id, &context)
        .await
        .unwrap();
    assert_eq!(plaintext, PLAINTEXT);
}

#[tokio::test]
async fn test_quorum_does_not_wait_for_slow_participant() {
    let d = deploy(&[
        Member::Node(NodeBehavior::Honest),
        Member::Node(NodeBehavior::Honest),
        Member::Node(NodeBehavior::Delayed(Duration::from_secs(30))),
    ]);
    let requester = Ed25519AuthSigner::from_seed([15; 32]);
    script_ownership(&d.effects, &requester.address());
    let kit = encrypted_kit(&d).await;
    let context = RequesterContext::with_signer(&requester);

    let started = Instant::now();
    let plaintext = d
        .client
        .retrieve_and_decrypt(&kit, d.fixture.ritual.id, &context)
        .await
        .unwrap();
    assert_eq!(plaintext, PLAINTEXT);
    // Request timeout is 2s; finishing well before it means the slow call was dropped.
    assert!(started.elapsed() < Duration::from_millis(1_500));

    let result = d
        .client
        .retrieve(&kit, d.fixture.ritual.id, &context)
        .await
        .unwrap();
    assert_matches!(
        result.errors.get(&d.fixture.members[2].address),
        Some(ParticipantError::Transport { message }) if message.contains("quorum was reached")
    );
}

#[tokio::test]
async fn test_stripped_conditions_are_refused() {
    let d = deploy(&[Member::Node(NodeBehavior::Honest); 3]);
    let requester = Ed25519AuthSigner::from_seed([15; 32]);
    script_ownership(&d.effects, &Address::from_bytes([2; 20]));
    let kit = encrypted_kit(&d).await;
    let context = RequesterContext::with_signer(&requester);

    let mut stripped = kit.clone();
    stripped.acp.authenticated_data.conditions = None;
    let err = d
        .client
        .retrieve(&stripped, d.fixture.ritual.id, &context)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        TesseraError::QuorumNotMet { received: 0, ref errors, .. }
            if errors.len() == 3
                && errors.values().all(|e| e.contains("Authorization does not match"))
    );

    // Re-signing under the requester's own key still leaves the header
    // committed to the original conditions.
    let aad = stripped.acp.authenticated_data.aad().unwrap();
    let digest = stripped.ciphertext.header.digest(&aad);
    stripped.acp.authorization = requester.sign(&digest).await.unwrap();
    stripped.acp.authorizer_public_key = requester.public_key();
    let err = d
        .client
        .retrieve(&stripped, d.fixture.ritual.id, &context)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        TesseraError::QuorumNotMet { received: 0, ref errors, .. }
            if errors.len() == 3
                && errors.values().all(|e| e.contains("does not match associated data"))
    );
}

#[tokio::test]
async fn test_wrong_ritual_response_is_excluded() {
    let d = deploy(&[
        Member::ClaimsRitual(2),
        Member::Node(SLOW),
        Member::Node(SLOW),
    ]);
    let requester = Ed25519AuthSigner::from_seed([15; 32]);
    script_ownership(&d.effects, &requester.address());
    let kit = encrypted_kit(&d).await;
    let context = RequesterContext::with_signer(&requester);

    let result = d
        .client
        .retrieve(&kit, d.fixture.ritual.id, &context)
        .await
        .unwrap();
    assert_eq!(result.shares.len(), 2);
    assert!(!result.shares.contains_key(&d.fixture.members[0].address));
    assert_matches!(
        result.errors.get(&d.fixture.members[0].address),
        Some(ParticipantError::RitualMismatch { .. })
    );

    let plaintext = d
        .client
        .retrieve_and_decrypt(&kit, d.fixture.ritual.id, &context)
        .await
        .unwrap();
    assert_eq!(plaintext, PLAINTEXT);
}

#[tokio::test]
async fn test_wrong_ritual_response_cannot_complete_quorum() {
    let d = deploy(&[
        Member::ClaimsRitual(2),
        Member::Node(NodeBehavior::Honest),
        Member::Node(NodeBehavior::Offline),
    ]);
    let requester = Ed25519AuthSigner::from_seed([15; 32]);
    script_ownership(&d.effects, &requester.address());
    let kit = encrypted_kit(&d).await;
    let context = RequesterContext::with_signer(&requester);

    let err = d
        .client
        .retrieve(&kit, d.fixture.ritual.id, &context)
        .await
        .unwrap_err();
    assert_matches!(err, TesseraError::QuorumNotMet { received: 1, .. });
}

#[tokio::test]
async fn test_unknown_ritual_fails_before_fan_out() {
    let d = deploy(&[Member::Node(NodeBehavior::Honest); 3]);
    let requester = Ed25519AuthSigner::from_seed([15; 32]);
    let kit = encrypted_kit(&d).await;
    let context = RequesterContext::with_signer(&requester);

    let err = d
        .client
        .retrieve(&kit, RitualId::new(404), &context)
        .await
        .unwrap_err();
    assert_matches!(err, TesseraError::RosterUnavailable { .. });
}

#[tokio::test]
async fn test_missing_signer_is_unresolved() {
    let d = deploy(&[Member::Node(NodeBehavior::Honest); 3]);
    let kit = encrypted_kit(&d).await;

    let err = d
        .client
        .retrieve(&kit, d.fixture.ritual.id, &RequesterContext::default())
        .await
        .unwrap_err();
    assert_matches!(err, TesseraError::UnresolvedParameter { .. });
}
