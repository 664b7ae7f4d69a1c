//! Participant roster source.

use crate::errors::Result;
use crate::identifiers::RitualId;
use crate::types::{Participant, Ritual};
use async_trait::async_trait;

/// Backing directory of rituals and their participants
#[async_trait]
pub trait RosterEffects: Send + Sync {
    /// Ritual metadata
    async fn get_ritual(&self, ritual_id: RitualId) -> Result<Ritual>;

    /// Participants of a ritual, in roster order
    async fn get_participants(&self, ritual_id: RitualId) -> Result<Vec<Participant>>;
}
