//! # Tessera Protocol
//!
//! Threshold decryption orchestration.
//!
//! - **directory**: full ritual roster or `RosterUnavailable`
//! - **session**: one ephemeral key per attempt, one secret per participant
//! - **codec**: sealed request per participant, per-participant decode errors
//! - **fanout**: concurrent one-shot calls behind the relay interface
//! - **aggregator**: `Collecting → Satisfied | Failed` over ritual-matching shares
//! - **client** / **node**: the requester and participant ends
//! - **encryption**: message kits with conditions and authorization

#![forbid(unsafe_code)]

pub mod aggregator;
pub mod client;
pub mod codec;
pub mod directory;
pub mod encryption;
pub mod fanout;
pub mod node;
pub mod session;

pub use aggregator::{QuorumAggregator, QuorumState, RetrievalResult};
pub use client::{RequesterContext, ThresholdDecryptionClient};
pub use codec::RequestCodec;
pub use directory::{ParticipantDirectory, RitualRoster};
pub use encryption::encrypt_message;
pub use fanout::FanoutRelay;
pub use node::{DecryptionNode, NodeEffects};
pub use session::{RandomSessionKeyFactory, Session, SessionKeyFactory, SessionNegotiator};
