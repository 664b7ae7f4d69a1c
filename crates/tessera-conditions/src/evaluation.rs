//! Participant-side evaluation of a condition expression.

use crate::condition::Condition;
use crate::compound::Operator;
use crate::context::ConditionContext;
use crate::expression::ConditionExpression;
use crate::params::USER_ADDRESS_PARAM;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_core::{ChainReaderEffects, NodeConfig, Result, TesseraError, TimeEffects};
use tracing::{debug, trace};

/// Effects the evaluator needs.
pub trait EvaluationEffects: ChainReaderEffects + TimeEffects {}

impl<T> EvaluationEffects for T where T: ChainReaderEffects + TimeEffects {}

/// Decides whether a requester's context satisfies an expression.
pub struct ConditionEvaluator<E: EvaluationEffects> {
    effects: Arc<E>,
    max_auth_proof_age_secs: u64,
}

impl<E: EvaluationEffects> ConditionEvaluator<E> {
    /// Create an evaluator with the node's proof age limit.
    pub fn new(effects: Arc<E>, config: &NodeConfig) -> Self {
        Self {
            effects,
            max_auth_proof_age_secs: config.max_auth_proof_age_secs,
        }
    }

    /// Verify the requester proof, bind placeholders, and evaluate the tree.
    ///
    /// `and`/`or` short-circuit left to right.
    pub async fn evaluate(
        &self,
        expression: &ConditionExpression,
        context: &ConditionContext,
    ) -> Result<bool> {
        let bindings = self.bindings(context)?;
        let bound = expression.condition.substitute(&bindings)?;
        let satisfied = self.eval(&bound).await?;
        debug!(satisfied, "Evaluated condition expression");
        Ok(satisfied)
    }

    fn bindings(&self, context: &ConditionContext) -> Result<BTreeMap<String, Value>> {
        let mut bindings = BTreeMap::new();
        for (name, value) in context.iter() {
            if name != USER_ADDRESS_PARAM {
                bindings.insert(name.clone(), value.clone());
            }
        }
        if let Some(proof) = context.auth_proof()? {
            proof.verify(self.effects.now_unix_secs(), self.max_auth_proof_age_secs)?;
            bindings.insert(
                USER_ADDRESS_PARAM.to_string(),
                Value::from(proof.address.as_str()),
            );
        }
        Ok(bindings)
    }

    fn eval<'a>(&'a self, condition: &'a Condition) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            match condition {
                Condition::Contract(c) => {
                    let value = self.effects.read_call(&c.read_call()).await?;
                    trace!(method = %c.method, contract = %c.contract_address, "Contract read");
                    c.return_value_test.evaluate(&value)
                }
                Condition::Rpc(c) => {
                    let value = self.effects.read_call(&c.read_call()).await?;
                    trace!(method = %c.method, chain = %c.chain, "RPC read");
                    c.return_value_test.evaluate(&value)
                }
                Condition::Time(c) => {
                    let timestamp = self.effects.block_timestamp(c.chain).await?;
                    c.return_value_test.evaluate(&Value::from(timestamp))
                }
                Condition::Compound(c) => match c.operator {
                    Operator::And => {
                        for operand in &c.operands {
                            if !self.eval(operand).await? {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    }
                    Operator::Or => {
                        for operand in &c.operands {
                            if self.eval(operand).await? {
                                return Ok(true);
                            }
                        }
                        Ok(false)
                    }
                    Operator::Not => match c.operands.as_slice() {
                        [only] => Ok(!self.eval(only).await?),
                        operands => Err(TesseraError::invalid(format!(
                            "`not` takes exactly one operand, got {}",
                            operands.len()
                        ))),
                    },
                },
            }
        })
    }
}
