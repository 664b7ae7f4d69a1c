//! Tessera Core - foundation for condition-gated threshold decryption
//!
//! This crate holds everything the condition engine and the decryption
//! protocol share: identifiers, the unified error type, configuration, the
//! accumulating field validator, session key agreement and the sealed
//! envelope, protocol messages, and the effect traits through which every
//! other crate reaches the outside world.
//!
//! # Layering
//!
//! - `tessera-core` (this crate): types and effect interfaces, no I/O
//! - `tessera-conditions`: condition trees, validation, context resolution
//! - `tessera-protocol`: directory, session, codec, quorum, client and node
//! - `tessera-effects`: production effect handlers
//! - `tessera-testkit`: deterministic handlers and fixtures

#![forbid(unsafe_code)]

/// Requester and node configuration
pub mod config;

/// Session key agreement, envelope AEAD, hashing, signature checks
pub mod crypto;

/// Effect interfaces (no implementations)
pub mod effects;

/// Unified error handling
pub mod errors;

/// Ritual, address and chain identifiers
pub mod identifiers;

/// Wire messages and the encrypted message kit
pub mod messages;

/// Ritual and participant data model
pub mod types;

/// Accumulating field validation
pub mod validation;

pub use config::{NodeConfig, RetrievalConfig, TesseraConfig};
pub use crypto::{
    SealedEnvelope, SessionPublicKey, SessionSharedSecret, SessionStaticSecret, SESSION_KEY_LEN,
};
pub use effects::{
    AuthSignerEffects, ChainReaderEffects, DecryptionService, DecryptionShareEffects,
    NodeTransport, RandomEffects, ReadCall, RelayEffects, RelayOutcome, RelaySink, RosterEffects,
    ThresholdCryptoEffects, ThresholdSharedSecret, TimeEffects,
};
pub use errors::{ParticipantError, Result, TesseraError};
pub use identifiers::{Address, ChainId, RitualId, SUPPORTED_CHAIN_IDS};
pub use messages::{
    AccessControlPolicy, AuthenticatedData, Ciphertext, CiphertextHeader, Conditions, Context,
    DecryptionRequest, DecryptionResponse, DecryptionShare, EncryptedDecryptionRequest,
    EncryptedDecryptionResponse, ThresholdMessageKit,
};
pub use types::{DkgPublicKey, Participant, Ritual};
pub use validation::{FieldIssue, FieldValidator};
