//! Named templates that expand to ordinary contract conditions.

use crate::contract::{ContractCondition, StandardContractType};
use crate::params::USER_ADDRESS_PARAM;
use crate::return_value::{Comparator, ReturnValueTest};
use serde_json::Value;
use tessera_core::{Address, ChainId};

/// The requester owns token `token_id` of an ERC721 collection.
pub fn erc721_ownership(contract_address: Address, chain: ChainId, token_id: u64) -> ContractCondition {
    ContractCondition {
        contract_address,
        chain,
        method: "ownerOf".to_string(),
        parameters: vec![Value::from(token_id)],
        standard_contract_type: Some(StandardContractType::Erc721),
        function_abi: None,
        return_value_test: ReturnValueTest::new(Comparator::Equal, USER_ADDRESS_PARAM),
    }
}

/// The requester holds at least `min_balance` tokens of an ERC721 collection.
pub fn erc721_balance(contract_address: Address, chain: ChainId, min_balance: u64) -> ContractCondition {
    ContractCondition {
        contract_address,
        chain,
        method: "balanceOf".to_string(),
        parameters: vec![Value::from(USER_ADDRESS_PARAM)],
        standard_contract_type: Some(StandardContractType::Erc721),
        function_abi: None,
        return_value_test: ReturnValueTest::new(Comparator::GreaterOrEqual, min_balance),
    }
}
