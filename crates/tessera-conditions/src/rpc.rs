//! Node RPC conditions.

use crate::params::is_context_param;
use crate::return_value::ReturnValueTest;
use crate::schema::{
    array_field, chain_field, context_param_value, expect_object, literal_field,
    reject_unknown_keys, required,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_core::identifiers::is_valid_address;
use tessera_core::validation::FieldValidator;
use tessera_core::{ChainId, ReadCall};

/// The only RPC method a condition may call.
pub const ETH_GET_BALANCE: &str = "eth_getBalance";

/// Block tags accepted as the second balance parameter.
pub const BLOCK_TAGS: [&str; 5] = ["latest", "earliest", "pending", "safe", "finalized"];

/// Calls a node RPC method and tests the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcCondition {
    /// Chain to query
    pub chain: ChainId,
    /// RPC method
    pub method: String,
    /// `[address, blockTag?]`
    pub parameters: Vec<Value>,
    /// Expected result
    pub return_value_test: ReturnValueTest,
}

impl RpcCondition {
    /// Wire tag.
    pub const CONDITION_TYPE: &'static str = "rpc";

    /// Balance of `account` (an address or placeholder) at the latest block.
    pub fn balance(chain: ChainId, account: impl Into<String>, test: ReturnValueTest) -> Self {
        Self {
            chain,
            method: ETH_GET_BALANCE.to_string(),
            parameters: vec![Value::String(account.into()), Value::from("latest")],
            return_value_test: test,
        }
    }

    /// Read call this condition performs once placeholders are bound.
    pub fn read_call(&self) -> ReadCall {
        ReadCall {
            chain: self.chain,
            contract_address: None,
            method: self.method.clone(),
            parameters: self.parameters.clone(),
        }
    }

    pub(crate) fn check(v: &mut FieldValidator, value: &Value) {
        let Some(obj) = expect_object(v, "", value) else {
            return;
        };
        reject_unknown_keys(
            v,
            obj,
            &["conditionType", "chain", "method", "parameters", "returnValueTest"],
        );
        if obj.contains_key("conditionType") {
            literal_field(v, obj, "conditionType", Self::CONDITION_TYPE);
        }
        chain_field(v, obj, "chain");
        literal_field(v, obj, "method", ETH_GET_BALANCE);

        if let Some(parameters) = array_field(v, obj, "parameters") {
            check_balance_parameters(v, parameters);
        }
        if let Some(test) = required(v, obj, "returnValueTest") {
            let mut nested = v.for_field("returnValueTest");
            ReturnValueTest::check(&mut nested, test);
            v.merge(nested);
        }
    }
}

fn check_balance_parameters(v: &mut FieldValidator, parameters: &[Value]) {
    if parameters.is_empty() || parameters.len() > 2 {
        v.issue("parameters", "Expected an address and an optional block tag");
        return;
    }
    match parameters[0].as_str() {
        Some(account) if is_valid_address(account) || is_context_param(account) => {}
        _ => {
            v.issue("parameters[0]", "Expected an address or context parameter");
            context_param_value(v, "parameters[0]", &parameters[0]);
        }
    }
    if let Some(tag) = parameters.get(1) {
        let known = tag
            .as_str()
            .map(|tag| BLOCK_TAGS.contains(&tag))
            .unwrap_or(false);
        if !known {
            v.issue("parameters[1]", "Expected a block tag");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::return_value::Comparator;
    use crate::schema::format_issues;
    use serde_json::json;

    #[test]
    fn test_balance_condition_is_valid() {
        let condition = RpcCondition::balance(
            ChainId::Sepolia,
            ":userAddress",
            ReturnValueTest::new(Comparator::GreaterThan, 0),
        );
        let mut v = FieldValidator::new();
        RpcCondition::check(&mut v, &serde_json::to_value(&condition).unwrap());
        assert!(!v.has_issues());
    }

    #[test]
    fn test_other_methods_rejected() {
        let mut v = FieldValidator::new();
        RpcCondition::check(
            &mut v,
            &json!({
                "chain": 1,
                "method": "eth_call",
                "parameters": ["0x0000000000000000000000000000000000000001", "tomorrow"],
                "returnValueTest": {"comparator": ">", "value": 0}
            }),
        );
        let issues = format_issues(&v.into_issues());
        assert!(issues.contains_key("method"));
        assert!(issues.contains_key("parameters[1]"));
    }
}
