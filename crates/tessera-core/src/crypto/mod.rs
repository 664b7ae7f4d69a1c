//! Cryptographic building blocks owned by the core.
//!
//! Session key agreement and the request/response envelope are fully specified
//! here; threshold encryption itself stays behind
//! [`ThresholdCryptoEffects`](crate::effects::ThresholdCryptoEffects).

pub mod ed25519;
pub mod envelope;
pub mod hash;
pub mod session;

pub use ed25519::ed25519_verify;
pub use envelope::{SealedEnvelope, NONCE_LEN};
pub use hash::{hash, hasher, Hasher};
pub use session::{SessionPublicKey, SessionSharedSecret, SessionStaticSecret, SESSION_KEY_LEN};
