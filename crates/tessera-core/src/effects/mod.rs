//! Effect trait definitions
//!
//! Every interaction with the outside world (randomness, clocks, chain reads,
//! the participant roster, the relay, signing and threshold cryptography)
//! goes through one of these traits. Production handlers live in
//! `tessera-effects`; deterministic ones in `tessera-testkit`. Protocol code
//! takes them as constructor parameters, never as globals.

pub mod chain;
pub mod random;
pub mod relay;
pub mod roster;
pub mod signer;
pub mod threshold;
pub mod time;

pub use chain::{ChainReaderEffects, ReadCall};
pub use random::RandomEffects;
pub use relay::{DecryptionService, NodeTransport, RelayEffects, RelayOutcome, RelaySink};
pub use roster::RosterEffects;
pub use signer::AuthSignerEffects;
pub use threshold::{DecryptionShareEffects, ThresholdCryptoEffects, ThresholdSharedSecret};
pub use time::TimeEffects;
