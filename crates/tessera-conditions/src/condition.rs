//! The closed set of condition variants and their shared validation entry.

use crate::compound::{CompoundCondition, Operator};
use crate::contract::ContractCondition;
use crate::params::{collect_params, substitute_value};
use crate::return_value::ReturnValueTest;
use crate::rpc::{RpcCondition, ETH_GET_BALANCE};
use crate::schema::expect_object;
use crate::time::{TimeCondition, BLOCKTIME_METHOD};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tessera_core::validation::FieldValidator;
use tessera_core::{ChainId, Result, TesseraError};

/// Wire tag key of every condition object.
pub const CONDITION_TYPE_KEY: &str = "conditionType";

/// Discriminant of [`Condition`], used to select a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionType {
    /// [`ContractCondition`]
    Contract,
    /// [`RpcCondition`]
    Rpc,
    /// [`TimeCondition`]
    Time,
    /// [`CompoundCondition`]
    Compound,
}

impl ConditionType {
    /// Wire tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contract => ContractCondition::CONDITION_TYPE,
            Self::Rpc => RpcCondition::CONDITION_TYPE,
            Self::Time => TimeCondition::CONDITION_TYPE,
            Self::Compound => CompoundCondition::CONDITION_TYPE,
        }
    }

    /// Parse a wire tag.
    pub fn parse(tag: &str) -> Option<Self> {
        [Self::Contract, Self::Rpc, Self::Time, Self::Compound]
            .into_iter()
            .find(|ty| ty.as_str() == tag)
    }

    /// Infer the variant of an untagged object from its distinguishing fields.
    pub fn infer(obj: &Map<String, Value>) -> Option<Self> {
        if obj.contains_key("operator") || obj.contains_key("operands") {
            return Some(Self::Compound);
        }
        if obj.contains_key("contractAddress") {
            return Some(Self::Contract);
        }
        match obj.get("method").and_then(Value::as_str) {
            Some(BLOCKTIME_METHOD) => Some(Self::Time),
            Some(ETH_GET_BALANCE) => Some(Self::Rpc),
            _ => None,
        }
    }

    fn of(obj: &Map<String, Value>) -> std::result::Result<Self, Option<String>> {
        match obj.get(CONDITION_TYPE_KEY) {
            Some(Value::String(tag)) => Self::parse(tag).ok_or_else(|| Some(tag.clone())),
            Some(other) => Err(Some(other.to_string())),
            None => Self::infer(obj).ok_or(None),
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An access predicate: a leaf read/time check or a boolean combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "conditionType", rename_all = "lowercase")]
pub enum Condition {
    /// Contract read
    Contract(ContractCondition),
    /// Node RPC read
    Rpc(RpcCondition),
    /// Block time
    Time(TimeCondition),
    /// Boolean combination
    Compound(CompoundCondition),
}

impl Condition {
    /// Validate an object against the schema its tag selects and build the
    /// condition. On failure every violated field is reported.
    pub fn validate(value: &Value) -> Result<Self> {
        let mut v = FieldValidator::new();
        Self::check(&mut v, value, 0);
        v.finish().map_err(TesseraError::schema)?;
        Self::build(value)
    }

    /// Validate an object against one specific schema.
    pub fn validate_as(schema: ConditionType, value: &Value) -> Result<Self> {
        let mut v = FieldValidator::new();
        match value.as_object().map(ConditionType::of) {
            Some(Ok(found)) if found != schema => {
                v.issue(
                    CONDITION_TYPE_KEY,
                    format!("Invalid literal value, expected \"{schema}\""),
                );
            }
            _ => Self::check_variant(&mut v, schema, value, 0),
        }
        v.finish().map_err(TesseraError::schema)?;
        Self::build(value)
    }

    /// Alias of [`validate`](Self::validate) for the object form.
    pub fn from_object(value: &Value) -> Result<Self> {
        Self::validate(value)
    }

    /// Canonical object form, tagged with `conditionType`.
    pub fn to_object(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Variant of this condition.
    pub fn condition_type(&self) -> ConditionType {
        match self {
            Self::Contract(_) => ConditionType::Contract,
            Self::Rpc(_) => ConditionType::Rpc,
            Self::Time(_) => ConditionType::Time,
            Self::Compound(_) => ConditionType::Compound,
        }
    }

    /// Every placeholder referenced anywhere in the tree.
    pub fn context_params(&self) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        self.visit_leaves(&mut |parameters, test| {
            for parameter in parameters {
                collect_params(parameter, &mut found);
            }
            collect_params(&test.value, &mut found);
        });
        found
    }

    /// Chains the tree reads from, in traversal order without repeats.
    pub fn chains(&self) -> Vec<ChainId> {
        let mut chains = Vec::new();
        self.collect_chains(&mut chains);
        chains
    }

    /// Bind every placeholder. Names without a binding fail together.
    pub fn substitute(&self, bindings: &BTreeMap<String, Value>) -> Result<Self> {
        let mut missing = BTreeSet::new();
        let substituted = self.substitute_inner(bindings, &mut missing);
        if missing.is_empty() {
            Ok(substituted)
        } else {
            Err(TesseraError::unresolved(missing))
        }
    }

    pub(crate) fn check(v: &mut FieldValidator, value: &Value, depth: usize) {
        let Some(obj) = expect_object(v, "", value) else {
            return;
        };
        match ConditionType::of(obj) {
            Ok(ty) => Self::check_variant(v, ty, value, depth),
            Err(Some(tag)) => {
                v.issue(
                    CONDITION_TYPE_KEY,
                    format!(
                        "Invalid discriminator value. Expected 'contract' | 'rpc' | 'time' | 'compound', received {tag}"
                    ),
                );
            }
            Err(None) => {
                v.issue(CONDITION_TYPE_KEY, "Required");
            }
        }
    }

    fn check_variant(v: &mut FieldValidator, ty: ConditionType, value: &Value, depth: usize) {
        match ty {
            ConditionType::Contract => ContractCondition::check(v, value),
            ConditionType::Rpc => RpcCondition::check(v, value),
            ConditionType::Time => TimeCondition::check(v, value),
            ConditionType::Compound => CompoundCondition::check(v, value, depth + 1),
        }
    }

    /// Deserialize an already validated object, filling in inferred tags.
    fn build(value: &Value) -> Result<Self> {
        serde_json::from_value(with_tags(value))
            .map_err(|e| TesseraError::internal(format!("Validated condition failed to build: {e}")))
    }

    fn visit_leaves<F>(&self, f: &mut F)
    where
        F: FnMut(&[Value], &ReturnValueTest),
    {
        match self {
            Self::Contract(c) => f(&c.parameters, &c.return_value_test),
            Self::Rpc(c) => f(&c.parameters, &c.return_value_test),
            Self::Time(c) => f(&[], &c.return_value_test),
            Self::Compound(c) => c.operands.iter().for_each(|op| op.visit_leaves(f)),
        }
    }

    fn collect_chains(&self, out: &mut Vec<ChainId>) {
        let chain = match self {
            Self::Contract(c) => c.chain,
            Self::Rpc(c) => c.chain,
            Self::Time(c) => c.chain,
            Self::Compound(c) => {
                c.operands.iter().for_each(|op| op.collect_chains(out));
                return;
            }
        };
        if !out.contains(&chain) {
            out.push(chain);
        }
    }

    fn substitute_inner(
        &self,
        bindings: &BTreeMap<String, Value>,
        missing: &mut BTreeSet<String>,
    ) -> Self {
        let params = |parameters: &[Value], missing: &mut BTreeSet<String>| {
            parameters
                .iter()
                .map(|p| substitute_value(p, bindings, missing))
                .collect::<Vec<_>>()
        };
        let test = |test: &ReturnValueTest, missing: &mut BTreeSet<String>| ReturnValueTest {
            value: substitute_value(&test.value, bindings, missing),
            ..test.clone()
        };

        match self {
            Self::Contract(c) => Self::Contract(ContractCondition {
                parameters: params(&c.parameters, missing),
                return_value_test: test(&c.return_value_test, missing),
                ..c.clone()
            }),
            Self::Rpc(c) => Self::Rpc(RpcCondition {
                parameters: params(&c.parameters, missing),
                return_value_test: test(&c.return_value_test, missing),
                ..c.clone()
            }),
            Self::Time(c) => Self::Time(TimeCondition {
                return_value_test: test(&c.return_value_test, missing),
                ..c.clone()
            }),
            Self::Compound(c) => Self::Compound(CompoundCondition {
                operator: c.operator,
                operands: c
                    .operands
                    .iter()
                    .map(|op| op.substitute_inner(bindings, missing))
                    .collect(),
            }),
        }
    }
}

impl From<ContractCondition> for Condition {
    fn from(condition: ContractCondition) -> Self {
        Self::Contract(condition)
    }
}

impl From<RpcCondition> for Condition {
    fn from(condition: RpcCondition) -> Self {
        Self::Rpc(condition)
    }
}

impl From<TimeCondition> for Condition {
    fn from(condition: TimeCondition) -> Self {
        Self::Time(condition)
    }
}

impl From<CompoundCondition> for Condition {
    fn from(condition: CompoundCondition) -> Self {
        Self::Compound(condition)
    }
}

impl Condition {
    /// `self AND other`, flattening into an existing conjunction.
    pub fn and(self, other: Condition) -> Self {
        match self {
            Self::Compound(CompoundCondition {
                operator: Operator::And,
                mut operands,
            }) => {
                operands.push(other);
                CompoundCondition::and(operands).into()
            }
            this => CompoundCondition::and(vec![this, other]).into(),
        }
    }

    /// `self OR other`, flattening into an existing disjunction.
    pub fn or(self, other: Condition) -> Self {
        match self {
            Self::Compound(CompoundCondition {
                operator: Operator::Or,
                mut operands,
            }) => {
                operands.push(other);
                CompoundCondition::or(operands).into()
            }
            this => CompoundCondition::or(vec![this, other]).into(),
        }
    }
}

fn with_tags(value: &Value) -> Value {
    let Value::Object(obj) = value else {
        return value.clone();
    };
    let mut tagged = obj.clone();
    if !tagged.contains_key(CONDITION_TYPE_KEY) {
        if let Some(ty) = ConditionType::infer(obj) {
            tagged.insert(CONDITION_TYPE_KEY.to_string(), Value::from(ty.as_str()));
        }
    }
    if let Some(Value::Array(operands)) = obj.get("operands") {
        tagged.insert(
            "operands".to_string(),
            Value::Array(operands.iter().map(with_tags).collect()),
        );
    }
    Value::Object(tagged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema_issues;
    use assert_matches::assert_matches;
    use serde_json::json;

    const TEST_CONTRACT_ADDR: &str = "0x0000000000000000000000000000000000000001";

    fn contract_obj() -> Value {
        json!({
            "conditionType": "contract",
            "contractAddress": TEST_CONTRACT_ADDR,
            "chain": 11155111,
            "method": "balanceOf",
            "parameters": [":userAddress"],
            "standardContractType": "ERC20",
            "returnValueTest": {"comparator": ">=", "value": 0}
        })
    }

    fn time_obj() -> Value {
        json!({
            "conditionType": "time",
            "chain": 137,
            "method": "blocktime",
            "returnValueTest": {"comparator": ">", "value": 100}
        })
    }

    #[test]
    fn test_accepts_a_correct_schema() {
        let condition = Condition::validate_as(ConditionType::Contract, &contract_obj()).unwrap();
        assert_matches!(&condition, Condition::Contract(c) if c.contract_address.as_str() == TEST_CONTRACT_ADDR);
    }

    #[test]
    fn test_rejects_an_incorrect_schema() {
        let mut value = contract_obj();
        value["contractAddress"] = json!("0x123");
        let err = Condition::validate_as(ConditionType::Contract, &value).unwrap_err();
        assert_eq!(
            schema_issues(&err)["contractAddress"],
            vec!["Invalid", "String must contain exactly 42 character(s)"]
        );
    }

    #[test]
    fn test_rejects_non_integer_chain() {
        let mut value = contract_obj();
        value["chain"] = json!("not-an-integer");
        let err = Condition::validate(&value).unwrap_err();
        assert_eq!(
            schema_issues(&err)["chain"],
            vec![
                "Invalid literal value, expected 137",
                "Invalid literal value, expected 80002",
                "Invalid literal value, expected 11155111",
                "Invalid literal value, expected 1",
            ]
        );
    }

    #[test]
    fn test_reports_every_violated_field() {
        let mut value = contract_obj();
        value["contractAddress"] = json!("0x123");
        value["chain"] = json!(5);
        value.as_object_mut().unwrap().remove("method");
        let issues = schema_issues(&Condition::validate(&value).unwrap_err());
        assert!(issues.contains_key("contractAddress"));
        assert!(issues.contains_key("chain"));
        assert!(issues.contains_key("method"));
    }

    #[test]
    fn test_serializes_to_the_input_object() {
        let condition = Condition::validate(&contract_obj()).unwrap();
        assert_eq!(condition.to_object().unwrap(), contract_obj());
    }

    #[test]
    fn test_untagged_objects_are_inferred() {
        let mut value = time_obj();
        value.as_object_mut().unwrap().remove("conditionType");
        let condition = Condition::validate(&value).unwrap();
        assert_eq!(condition.condition_type(), ConditionType::Time);
        assert_eq!(condition.to_object().unwrap(), time_obj());
    }

    #[test]
    fn test_compound_errors_carry_operand_paths() {
        let mut bad = contract_obj();
        bad["chain"] = json!(5);
        let value = json!({"operator": "or", "operands": [time_obj(), bad]});
        let issues = schema_issues(&Condition::validate(&value).unwrap_err());
        assert_eq!(issues.len(), 1);
        assert!(issues.contains_key("operands[1].chain"));
    }

    #[test]
    fn test_compound_operand_counts() {
        let empty = json!({"operator": "and", "operands": []});
        assert!(schema_issues(&Condition::validate(&empty).unwrap_err()).contains_key("operands"));

        let not_two = json!({"operator": "not", "operands": [time_obj(), time_obj()]});
        assert!(schema_issues(&Condition::validate(&not_two).unwrap_err()).contains_key("operands"));

        let not_one = json!({"operator": "not", "operands": [time_obj()]});
        assert!(Condition::validate(&not_one).is_ok());
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let inner = json!({"operator": "and", "operands": [time_obj()]});
        let middle = json!({"operator": "or", "operands": [inner]});
        assert!(Condition::validate(&middle).is_ok());

        let outer = json!({"operator": "or", "operands": [middle]});
        assert!(Condition::validate(&outer).is_err());
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let value = json!({"conditionType": "oracle", "chain": 1});
        let issues = schema_issues(&Condition::validate(&value).unwrap_err());
        assert!(issues.contains_key(CONDITION_TYPE_KEY));
    }

    #[test]
    fn test_context_params_and_substitution() {
        let condition = Condition::validate(&json!({
            "operator": "and",
            "operands": [
                contract_obj(),
                {
                    "conditionType": "time",
                    "chain": 137,
                    "method": "blocktime",
                    "returnValueTest": {"comparator": ">", "value": ":notBefore"}
                }
            ]
        }))
        .unwrap();
        assert_eq!(
            condition.context_params(),
            BTreeSet::from([":notBefore".to_string(), ":userAddress".to_string()])
        );

        let partial = BTreeMap::from([(":notBefore".to_string(), json!(5))]);
        assert_matches!(
            condition.substitute(&partial),
            Err(TesseraError::UnresolvedParameter { names }) if names == vec![":userAddress".to_string()]
        );

        let mut full = partial;
        full.insert(":userAddress".to_string(), json!(TEST_CONTRACT_ADDR));
        let bound = condition.substitute(&full).unwrap();
        assert!(bound.context_params().is_empty());
        assert_eq!(bound.chains(), vec![ChainId::Sepolia, ChainId::Polygon]);
    }

    #[test]
    fn test_combinators_flatten() {
        let a = Condition::validate(&time_obj()).unwrap();
        let combined = a.clone().or(a.clone()).or(a);
        assert_matches!(combined, Condition::Compound(c) if c.operands.len() == 3 && c.operator == Operator::Or);
    }
}
