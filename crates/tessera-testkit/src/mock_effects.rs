//! Mock effects for deterministic testing
//!
//! [`MockEffects`] implements randomness, time and chain reads:
//! - seeded ChaCha20 randomness
//! - a fixed clock advanced explicitly by tests
//! - scripted read-call results and block timestamps
//!
//! Uses `std::sync::Mutex`; lock contention is not a concern in tests.

use async_trait::async_trait;
use rand::RngCore;
use rand_chacha::{rand_core::SeedableRng, ChaCha20Rng};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tessera_core::{
    ChainId, ChainReaderEffects, RandomEffects, ReadCall, Result, TesseraError, TimeEffects,
};

/// Clock value every mock starts at (2022-01-01 00:00:00 UTC).
pub const MOCK_START_SECS: u64 = 1_640_995_200;

/// Deterministic randomness, time and chain state
#[derive(Debug, Clone)]
pub struct MockEffects {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug)]
struct MockState {
    rng: ChaCha20Rng,
    now_secs: u64,
    // ReadCall holds JSON values, so no Hash/Ord; lookups are linear
    reads: Vec<(ReadCall, Value)>,
    block_timestamps: BTreeMap<ChainId, u64>,
}

impl MockEffects {
    /// Create deterministic mock effects with fixed seed
    pub fn deterministic() -> Self {
        Self::with_seed([42; 32])
    }

    /// Create mock effects with specific seed for reproducible tests
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                rng: ChaCha20Rng::from_seed(seed),
                now_secs: MOCK_START_SECS,
                reads: Vec::new(),
                block_timestamps: BTreeMap::new(),
            })),
        }
    }

    /// Script the result of a read call. Later calls replace earlier ones.
    pub fn set_read_result(&self, call: ReadCall, value: Value) {
        let mut state = self.state.lock().unwrap();
        state.reads.retain(|(existing, _)| existing != &call);
        state.reads.push((call, value));
    }

    /// Pin the latest block timestamp of a chain. Unpinned chains report the
    /// mock clock.
    pub fn set_block_timestamp(&self, chain: ChainId, timestamp: u64) {
        self.state
            .lock()
            .unwrap()
            .block_timestamps
            .insert(chain, timestamp);
    }

    /// Move the clock forward
    pub fn advance_time(&self, secs: u64) {
        self.state.lock().unwrap().now_secs += secs;
    }
}

impl RandomEffects for MockEffects {
    fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        self.state.lock().unwrap().rng.fill_bytes(&mut bytes);
        bytes
    }
}

impl TimeEffects for MockEffects {
    fn now_unix_secs(&self) -> u64 {
        self.state.lock().unwrap().now_secs
    }
}

#[async_trait]
impl ChainReaderEffects for MockEffects {
    async fn read_call(&self, call: &ReadCall) -> Result<Value> {
        let state = self.state.lock().unwrap();
        state
            .reads
            .iter()
            .find(|(scripted, _)| scripted == call)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| {
                TesseraError::network(format!(
                    "No scripted result for {} on chain {}",
                    call.method, call.chain
                ))
            })
    }

    async fn block_timestamp(&self, chain: ChainId) -> Result<u64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .block_timestamps
            .get(&chain)
            .copied()
            .unwrap_or(state.now_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_bytes() {
        let a = MockEffects::with_seed([1; 32]);
        let b = MockEffects::with_seed([1; 32]);
        assert_eq!(a.random_bytes(16), b.random_bytes(16));
        assert_ne!(a.random_bytes(16), MockEffects::with_seed([2; 32]).random_bytes(16));
    }

    #[tokio::test]
    async fn test_scripted_reads() {
        let effects = MockEffects::deterministic();
        let call = ReadCall {
            chain: ChainId::Polygon,
            contract_address: None,
            method: "eth_getBalance".to_string(),
            parameters: vec![Value::from("0x01"), Value::from("latest")],
        };
        assert!(effects.read_call(&call).await.is_err());

        effects.set_read_result(call.clone(), Value::from(5));
        effects.set_read_result(call.clone(), Value::from(6));
        assert_eq!(effects.read_call(&call).await.unwrap(), Value::from(6));
    }

    #[tokio::test]
    async fn test_block_timestamp_follows_clock_unless_pinned() {
        let effects = MockEffects::deterministic();
        effects.advance_time(10);
        assert_eq!(
            effects.block_timestamp(ChainId::Sepolia).await.unwrap(),
            MOCK_START_SECS + 10
        );
        effects.set_block_timestamp(ChainId::Sepolia, 7);
        assert_eq!(effects.block_timestamp(ChainId::Sepolia).await.unwrap(), 7);
    }
}
