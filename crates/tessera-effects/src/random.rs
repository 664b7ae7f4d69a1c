//! Random effect handler
//!
//! This is the handler layer where actual system randomness is provided.

use rand::RngCore;
use tessera_core::RandomEffects;

/// Real random handler backed by the thread-local CSPRNG
#[derive(Debug, Clone, Default)]
pub struct RealRandomHandler;

impl RealRandomHandler {
    /// Create a new real random handler
    pub fn new() -> Self {
        Self
    }
}

impl RandomEffects for RealRandomHandler {
    fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }
}
