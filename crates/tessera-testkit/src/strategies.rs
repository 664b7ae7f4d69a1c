//! Property test strategies for Tessera types

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use tessera_core::{Address, ChainId, RitualId, SUPPORTED_CHAIN_IDS};

/// Strategy for arbitrary account addresses
pub fn arb_address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from_bytes)
}

/// Strategy over the supported chains
pub fn arb_chain_id() -> impl Strategy<Value = ChainId> {
    proptest::sample::select(SUPPORTED_CHAIN_IDS.to_vec())
}

/// Strategy for ritual identifiers
pub fn arb_ritual_id() -> impl Strategy<Value = RitualId> {
    any::<u32>().prop_map(RitualId::new)
}

/// Strategy for `(threshold, shares)` with `1 <= threshold <= shares <= max_shares`
pub fn arb_threshold_params(max_shares: usize) -> impl Strategy<Value = (usize, usize)> {
    (1..=max_shares).prop_flat_map(|shares| (1..=shares, Just(shares)))
}
