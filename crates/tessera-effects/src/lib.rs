//! # Tessera Effects
//!
//! Production handlers for the effect traits defined in `tessera-core`.
//! Deterministic and misbehaving handlers for tests live in `tessera-testkit`.

#![forbid(unsafe_code)]

pub mod random;
pub mod roster;
pub mod signer;
pub mod threshold;
pub mod time;

pub use random::RealRandomHandler;
pub use roster::StaticRoster;
pub use signer::Ed25519AuthSigner;
pub use threshold::{
    generate_key_shares, KeyShare, RistrettoShareHandler, RistrettoThresholdHandler,
};
pub use time::RealTimeHandler;
