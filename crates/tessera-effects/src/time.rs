//! Time effect handler
//!
//! Stateless; delegates to the operating system clock.

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tessera_core::TimeEffects;

/// Real time handler for production use
#[derive(Debug, Clone, Default)]
pub struct RealTimeHandler;

impl RealTimeHandler {
    /// Create a new real time handler
    pub fn new() -> Self {
        Self
    }
}

impl TimeEffects for RealTimeHandler {
    fn now_unix_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}
