//! Block time conditions.

use crate::return_value::ReturnValueTest;
use crate::schema::{chain_field, expect_object, literal_field, reject_unknown_keys, required};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_core::validation::FieldValidator;
use tessera_core::ChainId;

/// Method name of the time condition.
pub const BLOCKTIME_METHOD: &str = "blocktime";

/// Tests the latest block timestamp of a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeCondition {
    /// Chain whose clock is read
    pub chain: ChainId,
    /// Always `blocktime`
    pub method: String,
    /// Test against the timestamp in Unix seconds
    pub return_value_test: ReturnValueTest,
}

impl TimeCondition {
    /// Wire tag.
    pub const CONDITION_TYPE: &'static str = "time";

    /// Condition on `chain`'s block time.
    pub fn new(chain: ChainId, return_value_test: ReturnValueTest) -> Self {
        Self {
            chain,
            method: BLOCKTIME_METHOD.to_string(),
            return_value_test,
        }
    }

    pub(crate) fn check(v: &mut FieldValidator, value: &Value) {
        let Some(obj) = expect_object(v, "", value) else {
            return;
        };
        reject_unknown_keys(v, obj, &["conditionType", "chain", "method", "returnValueTest"]);
        if obj.contains_key("conditionType") {
            literal_field(v, obj, "conditionType", Self::CONDITION_TYPE);
        }
        chain_field(v, obj, "chain");
        literal_field(v, obj, "method", BLOCKTIME_METHOD);
        if let Some(test) = required(v, obj, "returnValueTest") {
            let mut nested = v.for_field("returnValueTest");
            ReturnValueTest::check(&mut nested, test);
            v.merge(nested);
        }
    }
}
