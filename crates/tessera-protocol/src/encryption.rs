//! Encryptor side: threshold ciphertext plus its access control policy.

use tessera_conditions::ConditionExpression;
use tessera_core::{
    AccessControlPolicy, AuthSignerEffects, AuthenticatedData, DkgPublicKey, Result,
    ThresholdCryptoEffects, ThresholdMessageKit,
};
use tracing::debug;

/// Encrypt `plaintext` to a ritual key under optional conditions.
///
/// The conditions and ritual key are bound into the ciphertext as associated
/// data, and the header commits to that data. `authorizer` signs the digest of
/// header and associated data so participants can check the policy came from
/// the encryptor.
pub async fn encrypt_message(
    crypto: &dyn ThresholdCryptoEffects,
    plaintext: &[u8],
    public_key: &DkgPublicKey,
    conditions: Option<&ConditionExpression>,
    authorizer: &dyn AuthSignerEffects,
) -> Result<ThresholdMessageKit> {
    let authenticated_data = AuthenticatedData {
        public_key: public_key.clone(),
        conditions: conditions.map(ConditionExpression::to_conditions).transpose()?,
    };
    let aad = authenticated_data.aad()?;
    let ciphertext = crypto.encrypt(plaintext, public_key, &aad).await?;
    let authorization = authorizer.sign(&ciphertext.header.digest(&aad)).await?;

    debug!(
        bytes = plaintext.len(),
        conditional = authenticated_data.conditions.is_some(),
        authorizer = %authorizer.address(),
        "Encrypted message kit"
    );
    Ok(ThresholdMessageKit {
        ciphertext,
        acp: AccessControlPolicy {
            authenticated_data,
            authorization,
            authorizer_public_key: authorizer.public_key(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_conditions::{Comparator, ReturnValueTest, TimeCondition};
    use tessera_core::crypto::ed25519_verify;
    use tessera_core::ChainId;
    use tessera_effects::{Ed25519AuthSigner, RistrettoThresholdHandler};
    use tessera_testkit::{MockEffects, RitualFixture};

    #[tokio::test]
    async fn test_kit_binds_conditions_and_authorization() {
        let fixture = RitualFixture::new(2, 3, [1; 32]);
        let crypto = RistrettoThresholdHandler::new(MockEffects::deterministic());
        let authorizer = Ed25519AuthSigner::from_seed([4; 32]);
        let expression = ConditionExpression::new(TimeCondition::new(
            ChainId::Polygon,
            ReturnValueTest::new(Comparator::GreaterThan, 0),
        ));

        let kit = encrypt_message(
            &crypto,
            b"secret",
            fixture.public_key(),
            Some(&expression),
            &authorizer,
        )
        .await
        .unwrap();

        let attached = kit.acp.conditions().unwrap();
        assert_eq!(
            ConditionExpression::from_conditions(attached).unwrap(),
            expression
        );
        let aad = kit.acp.authenticated_data.aad().unwrap();
        assert!(ed25519_verify(
            &kit.acp.authorizer_public_key,
            &kit.ciphertext.header.digest(&aad),
            &kit.acp.authorization
        )
        .unwrap());
        assert_eq!(
            ThresholdMessageKit::from_bytes(&kit.to_bytes().unwrap()).unwrap(),
            kit
        );
    }
}
