//! Ritual and participant data model.

mod participant;

pub use participant::{DkgPublicKey, Participant, Ritual};
