//! Tessera Testing Infrastructure
//!
//! Deterministic effect handlers, ritual fixtures, misbehaving participant
//! transports and proptest strategies shared across the workspace's tests.
//!
//! ```toml
//! [dev-dependencies]
//! tessera-testkit = { path = "../tessera-testkit" }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod logging;
pub mod mock_effects;
pub mod strategies;
pub mod transport;

pub use fixtures::{FixtureMember, RitualFixture};
pub use logging::init_test_tracing;
pub use mock_effects::{MockEffects, MOCK_START_SECS};
pub use transport::{LocalNodeTransport, NodeBehavior, WrongRitualNode};
