//! # Tessera Conditions
//!
//! Access conditions attached to threshold ciphertexts.
//!
//! - **condition**: the closed `Contract | Rpc | Time | Compound` tree with a
//!   single validation entry point that reports every violated field
//! - **expression**: the versioned, canonically serialized envelope
//! - **predefined**: friendly templates that expand to contract conditions
//! - **context**: placeholder resolution for one decryption attempt,
//!   including the reserved `:userAddress` proof
//! - **evaluation**: participant-side evaluation against chain state

#![forbid(unsafe_code)]

pub mod auth;
pub mod compound;
pub mod condition;
pub mod context;
pub mod contract;
pub mod evaluation;
pub mod expression;
pub mod params;
pub mod predefined;
pub mod return_value;
pub mod rpc;
pub mod schema;
pub mod time;

pub use auth::{AuthProof, TypedAuthMessage};
pub use compound::{CompoundCondition, Operator};
pub use condition::{Condition, ConditionType};
pub use context::{ConditionContext, ContextResolver, ContextValueSource, ResolverEffects};
pub use contract::{AbiParam, ContractCondition, FunctionAbi, StandardContractType};
pub use evaluation::{ConditionEvaluator, EvaluationEffects};
pub use expression::{ConditionExpression, VERSION};
pub use params::{RESERVED_CONTEXT_PARAMS, USER_ADDRESS_PARAM};
pub use predefined::{erc721_balance, erc721_ownership};
pub use return_value::{Comparator, ReturnValueTest};
pub use rpc::RpcCondition;
pub use schema::{format_issues, schema_issues};
pub use time::TimeCondition;
