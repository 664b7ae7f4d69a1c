//! Fixed in-memory roster handler.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tessera_core::{Participant, Result, Ritual, RitualId, RosterEffects, TesseraError};

/// Roster of rituals known up front, e.g. loaded from deployment config.
#[derive(Debug, Clone, Default)]
pub struct StaticRoster {
    rituals: BTreeMap<RitualId, (Ritual, Vec<Participant>)>,
}

impl StaticRoster {
    /// Empty roster
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ritual and its participants in roster order
    pub fn with_ritual(mut self, ritual: Ritual, participants: Vec<Participant>) -> Self {
        self.rituals.insert(ritual.id, (ritual, participants));
        self
    }

    fn entry(&self, ritual_id: RitualId) -> Result<&(Ritual, Vec<Participant>)> {
        self.rituals
            .get(&ritual_id)
            .ok_or_else(|| TesseraError::roster_unavailable(ritual_id, "Unknown ritual"))
    }
}

#[async_trait]
impl RosterEffects for StaticRoster {
    async fn get_ritual(&self, ritual_id: RitualId) -> Result<Ritual> {
        Ok(self.entry(ritual_id)?.0.clone())
    }

    async fn get_participants(&self, ritual_id: RitualId) -> Result<Vec<Participant>> {
        Ok(self.entry(ritual_id)?.1.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tessera_core::DkgPublicKey;

    #[tokio::test]
    async fn test_unknown_ritual_is_roster_unavailable() {
        let roster = StaticRoster::new().with_ritual(
            Ritual {
                id: RitualId::new(1),
                dkg_size: 0,
                threshold: 0,
                public_key: DkgPublicKey(vec![]),
                aggregated_transcript_digest: None,
            },
            vec![],
        );
        assert!(roster.get_ritual(RitualId::new(1)).await.is_ok());
        assert_matches!(
            roster.get_participants(RitualId::new(2)).await,
            Err(TesseraError::RosterUnavailable { .. })
        );
    }
}
