//! Contract read conditions.

use crate::return_value::ReturnValueTest;
use crate::schema::{
    address_field, array_field, chain_field, context_param_value, expect_object, literal_field,
    reject_unknown_keys, required, string_field, type_name,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tessera_core::validation::FieldValidator;
use tessera_core::{Address, ChainId, ReadCall};

/// Token standards whose methods are known without an ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardContractType {
    /// Fungible token
    #[serde(rename = "ERC20")]
    Erc20,
    /// Non-fungible token
    #[serde(rename = "ERC721")]
    Erc721,
}

impl StandardContractType {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Erc20 => "ERC20",
            Self::Erc721 => "ERC721",
        }
    }

    /// Read methods callable on this standard.
    pub const fn methods(self) -> &'static [&'static str] {
        match self {
            Self::Erc20 => &["balanceOf"],
            Self::Erc721 => &["balanceOf", "ownerOf"],
        }
    }

    fn parse(name: &str) -> Option<Self> {
        [Self::Erc20, Self::Erc721]
            .into_iter()
            .find(|standard| standard.as_str() == name)
    }
}

/// One input or output of a function ABI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiParam {
    /// Parameter name
    pub name: String,
    /// Solidity type
    #[serde(rename = "type")]
    pub kind: String,
    /// Compiler-internal type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_type: Option<String>,
}

/// ABI of a single read-only function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionAbi {
    /// Function name; must equal the condition's method
    pub name: String,
    /// Always `function`
    #[serde(rename = "type")]
    pub kind: String,
    /// Inputs, one per condition parameter
    pub inputs: Vec<AbiParam>,
    /// Outputs
    pub outputs: Vec<AbiParam>,
    /// `view` or `pure`
    pub state_mutability: String,
}

/// Reads `method(parameters)` from a contract and tests the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCondition {
    /// Contract to call
    pub contract_address: Address,
    /// Chain the contract lives on
    pub chain: ChainId,
    /// Method name
    pub method: String,
    /// Call parameters; literals or placeholders
    pub parameters: Vec<Value>,
    /// Token standard, when the method comes from one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_contract_type: Option<StandardContractType>,
    /// Explicit ABI, when the method is custom
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_abi: Option<FunctionAbi>,
    /// Expected result
    pub return_value_test: ReturnValueTest,
}

impl ContractCondition {
    /// Wire tag.
    pub const CONDITION_TYPE: &'static str = "contract";

    const KEYS: [&'static str; 8] = [
        "conditionType",
        "contractAddress",
        "chain",
        "method",
        "parameters",
        "standardContractType",
        "functionAbi",
        "returnValueTest",
    ];

    /// Read call this condition performs once placeholders are bound.
    pub fn read_call(&self) -> ReadCall {
        ReadCall {
            chain: self.chain,
            contract_address: Some(self.contract_address.clone()),
            method: self.method.clone(),
            parameters: self.parameters.clone(),
        }
    }

    /// Schema rules for a contract condition object.
    pub(crate) fn check(v: &mut FieldValidator, value: &Value) {
        let Some(obj) = expect_object(v, "", value) else {
            return;
        };
        reject_unknown_keys(v, obj, &Self::KEYS);
        if obj.contains_key("conditionType") {
            literal_field(v, obj, "conditionType", Self::CONDITION_TYPE);
        }
        address_field(v, obj, "contractAddress");
        chain_field(v, obj, "chain");
        let method = string_field(v, obj, "method");
        if method == Some("") {
            v.issue("method", "String must contain at least 1 character(s)");
        }
        let parameters = array_field(v, obj, "parameters");
        if let Some(parameters) = parameters {
            for (index, parameter) in parameters.iter().enumerate() {
                context_param_value(v, &format!("parameters[{index}]"), parameter);
            }
        }
        if let Some(test) = required(v, obj, "returnValueTest") {
            let mut nested = v.for_field("returnValueTest");
            ReturnValueTest::check(&mut nested, test);
            v.merge(nested);
        }

        check_method_source(v, obj, method, parameters.map(Vec::len));
    }
}

/// Exactly one of `standardContractType` or `functionAbi` names the method.
fn check_method_source(
    v: &mut FieldValidator,
    obj: &Map<String, Value>,
    method: Option<&str>,
    parameter_count: Option<usize>,
) {
    match (obj.get("standardContractType"), obj.get("functionAbi")) {
        (Some(_), Some(_)) => {
            v.issue(
                "",
                "At most one of the fields standardContractType and functionAbi must be defined",
            );
        }
        (None, None) => {
            v.issue(
                "",
                "At least one of the fields standardContractType and functionAbi must be defined",
            );
        }
        (Some(standard), None) => {
            match standard.as_str().and_then(StandardContractType::parse) {
                Some(standard) => {
                    if let Some(method) = method {
                        if !standard.methods().contains(&method) {
                            v.issue(
                                "method",
                                format!(
                                    "Method {method} is not supported by {}",
                                    standard.as_str()
                                ),
                            );
                        }
                    }
                }
                None => {
                    v.issue(
                        "standardContractType",
                        format!("Invalid enum value. Expected 'ERC20' | 'ERC721', received {standard}"),
                    );
                }
            }
        }
        (None, Some(abi)) => {
            let mut nested = v.for_field("functionAbi");
            check_function_abi(&mut nested, abi, method, parameter_count);
            v.merge(nested);
        }
    }
}

fn check_function_abi(
    v: &mut FieldValidator,
    abi: &Value,
    method: Option<&str>,
    parameter_count: Option<usize>,
) {
    let Some(obj) = expect_object(v, "", abi) else {
        return;
    };
    if let Some(name) = string_field(v, obj, "name") {
        if let Some(method) = method {
            if name != method {
                v.issue("name", format!("Must match method name {method}"));
            }
        }
    }
    literal_field(v, obj, "type", "function");
    if let Some(mutability) = string_field(v, obj, "stateMutability") {
        if !matches!(mutability, "view" | "pure") {
            v.issue("stateMutability", "Only view or pure functions can be called");
        }
    }
    if let Some(inputs) = array_field(v, obj, "inputs") {
        if let Some(count) = parameter_count {
            if inputs.len() != count {
                v.issue(
                    "inputs",
                    format!("Expected {count} input(s) to match parameters, found {}", inputs.len()),
                );
            }
        }
        check_abi_params(v, "inputs", inputs);
    }
    if let Some(outputs) = array_field(v, obj, "outputs") {
        check_abi_params(v, "outputs", outputs);
    }
}

fn check_abi_params(v: &mut FieldValidator, field: &str, params: &[Value]) {
    v.each(field, params, |item, _, param| {
        let Some(obj) = expect_object(item, "", param) else {
            return;
        };
        string_field(item, obj, "name");
        match obj.get("type") {
            Some(Value::String(kind)) if !kind.is_empty() => {}
            Some(other) if !other.is_string() => {
                item.issue("type", format!("Expected string, received {}", type_name(other)));
            }
            _ => {
                item.issue("type", "Required");
            }
        }
    });
}
