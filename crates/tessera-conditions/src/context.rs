//! Condition context: placeholder bindings built fresh per decryption attempt.

use crate::auth::AuthProof;
use crate::expression::ConditionExpression;
use crate::params::{is_context_param, is_reserved, USER_ADDRESS_PARAM};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_core::{
    AuthSignerEffects, ChainReaderEffects, Context, RandomEffects, ReadCall, Result,
    TesseraError, TimeEffects,
};
use tracing::debug;

/// Nonce length of requester proofs.
const AUTH_NONCE_LEN: usize = 16;

/// Where a caller-supplied placeholder gets its value.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValueSource {
    /// A literal value
    Literal(Value),
    /// The result of an on-chain read at resolution time
    ReadCall(ReadCall),
}

impl From<Value> for ContextValueSource {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

/// Placeholder name to resolved value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionContext {
    values: BTreeMap<String, Value>,
}

impl ConditionContext {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound value of a placeholder.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Number of bound placeholders.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Requester proof, when the context carries one.
    pub fn auth_proof(&self) -> Result<Option<AuthProof>> {
        self.values
            .get(USER_ADDRESS_PARAM)
            .map(|value| serde_json::from_value(value.clone()).map_err(TesseraError::from))
            .transpose()
    }

    /// Serialized form carried inside a decryption request.
    pub fn to_context(&self) -> Result<Context> {
        Ok(Context(serde_json::to_string(self)?))
    }

    /// Parse the form produced by [`to_context`](Self::to_context).
    pub fn from_context(context: &Context) -> Result<Self> {
        Ok(serde_json::from_str(context.as_str())?)
    }

    pub(crate) fn insert(&mut self, name: String, value: Value) {
        self.values.insert(name, value);
    }
}

/// Effects the resolver needs.
pub trait ResolverEffects: ChainReaderEffects + TimeEffects + RandomEffects {}

impl<T> ResolverEffects for T where T: ChainReaderEffects + TimeEffects + RandomEffects {}

/// Binds every placeholder of an expression for one decryption attempt.
pub struct ContextResolver<E: ResolverEffects> {
    effects: Arc<E>,
}

impl<E: ResolverEffects> ContextResolver<E> {
    /// Create a resolver over `effects`.
    pub fn new(effects: Arc<E>) -> Self {
        Self { effects }
    }

    /// Resolve the placeholders `expression` references.
    ///
    /// `:userAddress` is always bound to a fresh proof from `signer`; callers
    /// supplying it get [`TesseraError::ReservedParameterConflict`]. Every
    /// other placeholder must appear in `custom`, or the whole resolution
    /// fails with [`TesseraError::UnresolvedParameter`] naming each one.
    pub async fn resolve(
        &self,
        expression: &ConditionExpression,
        custom: &BTreeMap<String, ContextValueSource>,
        signer: Option<&dyn AuthSignerEffects>,
    ) -> Result<ConditionContext> {
        for name in custom.keys() {
            if is_reserved(name) {
                return Err(TesseraError::reserved_conflict(name.clone()));
            }
            if !is_context_param(name) {
                return Err(TesseraError::invalid(format!(
                    "Invalid context parameter name {name:?}"
                )));
            }
        }

        let required = expression.context_params();
        let missing: Vec<&String> = required
            .iter()
            .filter(|name| match name.as_str() {
                USER_ADDRESS_PARAM => signer.is_none(),
                other => !custom.contains_key(other),
            })
            .collect();
        if !missing.is_empty() {
            return Err(TesseraError::unresolved(missing.into_iter().cloned()));
        }

        let mut context = ConditionContext::new();
        for name in required {
            let value = if name == USER_ADDRESS_PARAM {
                self.user_address_proof(expression, signer).await?
            } else {
                match custom.get(&name) {
                    Some(ContextValueSource::Literal(value)) => value.clone(),
                    Some(ContextValueSource::ReadCall(call)) => {
                        self.effects.read_call(call).await?
                    }
                    None => return Err(TesseraError::unresolved([name])),
                }
            };
            context.insert(name, value);
        }

        debug!(
            params = context.len(),
            chain = %expression.primary_chain(),
            "Resolved condition context"
        );
        Ok(context)
    }

    async fn user_address_proof(
        &self,
        expression: &ConditionExpression,
        signer: Option<&dyn AuthSignerEffects>,
    ) -> Result<Value> {
        let signer = signer.ok_or_else(|| TesseraError::unresolved([USER_ADDRESS_PARAM]))?;
        let nonce = self.effects.random_bytes(AUTH_NONCE_LEN);
        let proof = AuthProof::sign(
            signer,
            expression.primary_chain(),
            self.effects.now_unix_secs(),
            &nonce,
        )
        .await?;
        debug!(address = %proof.address, "Signed requester auth proof");
        Ok(serde_json::to_value(proof)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::predefined::erc721_ownership;
    use crate::time::TimeCondition;
    use crate::return_value::{Comparator, ReturnValueTest};
    use assert_matches::assert_matches;
    use serde_json::json;
    use tessera_core::{Address, ChainId};
    use tessera_effects::Ed25519AuthSigner;
    use tessera_testkit::MockEffects;

    fn time_gated() -> ConditionExpression {
        ConditionExpression::new(TimeCondition::new(
            ChainId::Polygon,
            ReturnValueTest::new(Comparator::GreaterThan, ":notBefore"),
        ))
    }

    fn owner_and_time() -> ConditionExpression {
        let owner = erc721_ownership(Address::from_bytes([1; 20]), ChainId::Sepolia, 3);
        ConditionExpression::new(Condition::from(owner).and(time_gated().condition))
    }

    fn resolver() -> ContextResolver<MockEffects> {
        ContextResolver::new(Arc::new(MockEffects::deterministic()))
    }

    #[tokio::test]
    async fn test_literal_params_resolve() {
        let custom = BTreeMap::from([(":notBefore".to_string(), json!(100).into())]);
        let context = resolver().resolve(&time_gated(), &custom, None).await.unwrap();
        assert_eq!(context.get(":notBefore"), Some(&json!(100)));
    }

    #[tokio::test]
    async fn test_missing_param_is_unresolved() {
        let err = resolver()
            .resolve(&time_gated(), &BTreeMap::new(), None)
            .await
            .unwrap_err();
        assert_matches!(err, TesseraError::UnresolvedParameter { names } if names == vec![":notBefore".to_string()]);
    }

    #[tokio::test]
    async fn test_user_address_cannot_be_supplied() {
        let custom = BTreeMap::from([(
            USER_ADDRESS_PARAM.to_string(),
            json!("0x0000000000000000000000000000000000000001").into(),
        )]);
        let signer = Ed25519AuthSigner::from_seed([3; 32]);
        let err = resolver()
            .resolve(&owner_and_time(), &custom, Some(&signer))
            .await
            .unwrap_err();
        assert_matches!(err, TesseraError::ReservedParameterConflict { name } if name == USER_ADDRESS_PARAM);
    }

    #[tokio::test]
    async fn test_user_address_resolves_from_signer() {
        let signer = Ed25519AuthSigner::from_seed([3; 32]);
        let custom = BTreeMap::from([(":notBefore".to_string(), json!(1).into())]);
        let context = resolver()
            .resolve(&owner_and_time(), &custom, Some(&signer))
            .await
            .unwrap();

        let proof = context.auth_proof().unwrap().unwrap();
        assert_eq!(proof.address, signer.address());
        assert_eq!(proof.typed_data.chain, ChainId::Sepolia);
    }

    #[tokio::test]
    async fn test_user_address_without_signer_is_unresolved() {
        let custom = BTreeMap::from([(":notBefore".to_string(), json!(1).into())]);
        let err = resolver()
            .resolve(&owner_and_time(), &custom, None)
            .await
            .unwrap_err();
        assert_matches!(err, TesseraError::UnresolvedParameter { names } if names == vec![USER_ADDRESS_PARAM.to_string()]);
    }

    #[tokio::test]
    async fn test_read_call_source_queries_chain() {
        let effects = MockEffects::deterministic();
        let call = ReadCall {
            chain: ChainId::Polygon,
            contract_address: None,
            method: "eth_blockNumber".to_string(),
            parameters: vec![],
        };
        effects.set_read_result(call.clone(), json!(42));
        let resolver = ContextResolver::new(Arc::new(effects));

        let custom = BTreeMap::from([(
            ":notBefore".to_string(),
            ContextValueSource::ReadCall(call),
        )]);
        let context = resolver.resolve(&time_gated(), &custom, None).await.unwrap();
        assert_eq!(context.get(":notBefore"), Some(&json!(42)));
    }

    #[tokio::test]
    async fn test_context_wire_roundtrip() {
        let custom = BTreeMap::from([(":notBefore".to_string(), json!(7).into())]);
        let context = resolver().resolve(&time_gated(), &custom, None).await.unwrap();
        let wire = context.to_context().unwrap();
        assert_eq!(ConditionContext::from_context(&wire).unwrap(), context);
    }
}
