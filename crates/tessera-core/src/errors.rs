//! Unified error system for Tessera
//!
//! A single error enum covers every failure surfaced to callers. Failures that
//! belong to one participant of a fan-out are modelled separately by
//! [`ParticipantError`] so they can be recorded without aborting siblings.

use crate::identifiers::{Address, RitualId};
use crate::validation::FieldIssue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unified error type for all Tessera operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum TesseraError {
    /// A condition object failed schema validation
    #[error("Schema validation failed: {}", format_issues(issues))]
    SchemaValidation {
        /// Every violated field, in traversal order
        issues: Vec<FieldIssue>,
    },

    /// One or more context parameters had no value at resolution time
    #[error("Unresolved context parameter(s): {}", names.join(", "))]
    UnresolvedParameter {
        /// Placeholder names without a value
        names: Vec<String>,
    },

    /// Caller attempted to supply a reserved context parameter
    #[error("Reserved context parameter {name} cannot be supplied by the caller")]
    ReservedParameterConflict {
        /// The reserved placeholder name
        name: String,
    },

    /// Participant roster could not be fetched or was incomplete
    #[error("Roster unavailable for ritual {ritual_id}: {message}")]
    RosterUnavailable {
        /// Ritual whose roster was requested
        ritual_id: RitualId,
        /// Error message describing the failure
        message: String,
    },

    /// Fewer than `threshold` valid shares were collected
    #[error(
        "Threshold of responses not met for ritual {ritual_id}: {received} of {threshold}; errors: {}",
        format_errors(errors)
    )]
    QuorumNotMet {
        /// Ritual being decrypted
        ritual_id: RitualId,
        /// Declared threshold
        threshold: usize,
        /// Valid shares received
        received: usize,
        /// Per-participant failures
        errors: BTreeMap<Address, String>,
    },

    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Cryptographic operation failed
    #[error("Crypto error: {message}")]
    Crypto {
        /// Error message describing the cryptographic failure
        message: String,
    },

    /// Network or transport error
    #[error("Network error: {message}")]
    Network {
        /// Error message describing the network issue
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl TesseraError {
    /// Create a schema validation error from collected issues
    pub fn schema(issues: Vec<FieldIssue>) -> Self {
        Self::SchemaValidation { issues }
    }

    /// Create an unresolved parameter error
    pub fn unresolved<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::UnresolvedParameter {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a reserved parameter conflict error
    pub fn reserved_conflict(name: impl Into<String>) -> Self {
        Self::ReservedParameterConflict { name: name.into() }
    }

    /// Create a roster unavailable error
    pub fn roster_unavailable(ritual_id: RitualId, message: impl Into<String>) -> Self {
        Self::RosterUnavailable {
            ritual_id,
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the caller may retry the whole operation unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RosterUnavailable { .. } | Self::Network { .. })
    }
}

/// Failure attributable to a single participant of a decryption attempt.
///
/// These never abort the fan-out; they only shrink the pool competing for quorum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ParticipantError {
    /// Response payload was malformed or could not be decrypted
    #[error("Decode error: {message}")]
    Decode {
        /// What went wrong while decoding
        message: String,
    },

    /// Response was bound to a different ritual than requested
    #[error("Ritual id mismatch: expected {expected}, got {actual}")]
    RitualMismatch {
        /// Ritual the request was made for
        expected: RitualId,
        /// Ritual the response carried
        actual: RitualId,
    },

    /// Transport or participant-side failure
    #[error("Transport error: {message}")]
    Transport {
        /// Error string reported by the relay or node
        message: String,
    },
}

impl ParticipantError {
    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// Standard Result type for Tessera operations
pub type Result<T> = std::result::Result<T, TesseraError>;

impl From<serde_json::Error> for TesseraError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<bincode::Error> for TesseraError {
    fn from(err: bincode::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for TesseraError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err.to_string())
    }
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_errors(errors: &BTreeMap<Address, String>) -> String {
    errors
        .iter()
        .map(|(address, error)| format!("{address}: {error}"))
        .collect::<Vec<_>>()
        .join("; ")
}
