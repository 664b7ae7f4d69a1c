//! On-chain read effect
//!
//! Used only by condition evaluation and context resolution. How chain state
//! is indexed or reached is outside the core.

use crate::errors::Result;
use crate::identifiers::{Address, ChainId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A read-only call against a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadCall {
    /// Target chain
    pub chain: ChainId,
    /// Contract to call; `None` for node RPC methods such as `eth_getBalance`
    pub contract_address: Option<Address>,
    /// Contract or RPC method name
    pub method: String,
    /// Concrete call parameters
    pub parameters: Vec<serde_json::Value>,
}

/// Chain reader interface
#[async_trait]
pub trait ChainReaderEffects: Send + Sync {
    /// Execute a read call and return its decoded value
    async fn read_call(&self, call: &ReadCall) -> Result<serde_json::Value>;

    /// Timestamp of the latest block on `chain`, in Unix seconds
    async fn block_timestamp(&self, chain: ChainId) -> Result<u64>;
}
