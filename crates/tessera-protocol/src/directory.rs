//! Participant directory: the full roster of a ritual or an explicit error.

use std::collections::BTreeSet;
use std::sync::Arc;
use tessera_core::{Participant, Result, Ritual, RitualId, RosterEffects, TesseraError};
use tracing::{debug, warn};

/// Ritual metadata together with its complete roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RitualRoster {
    /// Public ritual parameters
    pub ritual: Ritual,
    /// Participants in roster order
    pub participants: Vec<Participant>,
}

/// Resolves the participants of a ritual, fresh on every call.
pub struct ParticipantDirectory {
    roster: Arc<dyn RosterEffects>,
}

impl ParticipantDirectory {
    /// Directory over a roster source.
    pub fn new(roster: Arc<dyn RosterEffects>) -> Self {
        Self { roster }
    }

    /// Fetch the ritual and every one of its participants.
    ///
    /// Fails with [`TesseraError::RosterUnavailable`] when the source cannot
    /// be reached, the ritual is unknown, or fewer participants come back
    /// than the ritual declares.
    pub async fn fetch(&self, ritual_id: RitualId) -> Result<RitualRoster> {
        let ritual = self
            .roster
            .get_ritual(ritual_id)
            .await
            .map_err(|e| unavailable(ritual_id, e))?;
        let participants = self
            .roster
            .get_participants(ritual_id)
            .await
            .map_err(|e| unavailable(ritual_id, e))?;

        if participants.len() != ritual.dkg_size {
            warn!(
                ritual = %ritual_id,
                declared = ritual.dkg_size,
                received = participants.len(),
                "Roster size does not match ritual"
            );
            return Err(TesseraError::roster_unavailable(
                ritual_id,
                format!(
                    "Roster has {} participants, ritual declares {}",
                    participants.len(),
                    ritual.dkg_size
                ),
            ));
        }
        if ritual.threshold == 0 || ritual.threshold > ritual.dkg_size {
            return Err(TesseraError::invalid(format!(
                "Ritual {ritual_id} threshold {} is outside 1..={}",
                ritual.threshold, ritual.dkg_size
            )));
        }

        debug!(
            ritual = %ritual_id,
            participants = participants.len(),
            threshold = ritual.threshold,
            "Fetched ritual roster"
        );
        Ok(RitualRoster {
            ritual,
            participants,
        })
    }

    /// Fetch a ritual and check its roster against the published transcript
    /// digest.
    ///
    /// Checks that addresses are unique, that every participant carries a
    /// transcript, and that the digest over the ordered transcripts equals
    /// the ritual's aggregated digest.
    pub async fn verify_ritual(&self, ritual_id: RitualId) -> Result<RitualRoster> {
        let roster = self.fetch(ritual_id).await?;

        let mut seen = BTreeSet::new();
        for participant in &roster.participants {
            if !seen.insert(&participant.address) {
                return Err(TesseraError::invalid(format!(
                    "Duplicate participant {} in ritual {ritual_id}",
                    participant.address
                )));
            }
        }

        let mut transcripts = Vec::with_capacity(roster.participants.len());
        for participant in &roster.participants {
            let transcript = participant.transcript.as_deref().ok_or_else(|| {
                TesseraError::invalid(format!(
                    "Participant {} has no transcript",
                    participant.address
                ))
            })?;
            transcripts.push((&participant.address, transcript));
        }

        let expected = roster.ritual.aggregated_transcript_digest.ok_or_else(|| {
            TesseraError::invalid(format!(
                "Ritual {ritual_id} has no aggregated transcript digest"
            ))
        })?;
        if Ritual::transcript_digest(transcripts) != expected {
            return Err(TesseraError::invalid(format!(
                "Transcript digest mismatch for ritual {ritual_id}"
            )));
        }

        debug!(ritual = %ritual_id, "Verified ritual transcripts");
        Ok(roster)
    }
}

fn unavailable(ritual_id: RitualId, err: TesseraError) -> TesseraError {
    match err {
        TesseraError::RosterUnavailable { .. } => err,
        other => TesseraError::roster_unavailable(ritual_id, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tessera_effects::StaticRoster;
    use tessera_testkit::RitualFixture;

    fn directory(roster: StaticRoster) -> ParticipantDirectory {
        ParticipantDirectory::new(Arc::new(roster))
    }

    #[tokio::test]
    async fn test_full_roster_returned_in_order() {
        let fixture = RitualFixture::new(2, 3, [1; 32]);
        let roster = directory(fixture.roster())
            .fetch(fixture.ritual.id)
            .await
            .unwrap();
        assert_eq!(roster.participants, fixture.participants());
        assert_eq!(roster.ritual.threshold, 2);
    }

    #[tokio::test]
    async fn test_unknown_ritual_is_unavailable() {
        let fixture = RitualFixture::new(2, 3, [1; 32]);
        let err = directory(fixture.roster())
            .fetch(RitualId::new(99))
            .await
            .unwrap_err();
        assert_matches!(err, TesseraError::RosterUnavailable { ritual_id, .. } if ritual_id == RitualId::new(99));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_partial_roster_is_an_error() {
        let fixture = RitualFixture::new(2, 3, [1; 32]);
        let mut participants = fixture.participants();
        participants.pop();
        let roster = StaticRoster::new().with_ritual(fixture.ritual.clone(), participants);
        assert_matches!(
            directory(roster).fetch(fixture.ritual.id).await,
            Err(TesseraError::RosterUnavailable { .. })
        );
    }

    #[tokio::test]
    async fn test_verify_ritual_accepts_fixture() {
        let fixture = RitualFixture::new(2, 3, [1; 32]);
        assert!(directory(fixture.roster())
            .verify_ritual(fixture.ritual.id)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_verify_ritual_detects_reordered_transcripts() {
        let fixture = RitualFixture::new(2, 3, [1; 32]);
        let mut participants = fixture.participants();
        participants.swap(0, 2);
        let roster = StaticRoster::new().with_ritual(fixture.ritual.clone(), participants);
        assert_matches!(
            directory(roster).verify_ritual(fixture.ritual.id).await,
            Err(TesseraError::Invalid { message }) if message.contains("digest")
        );
    }

    #[tokio::test]
    async fn test_verify_ritual_rejects_duplicates_and_missing_transcripts() {
        let fixture = RitualFixture::new(2, 3, [1; 32]);

        let mut duplicated = fixture.participants();
        duplicated[1] = duplicated[0].clone();
        let roster = StaticRoster::new().with_ritual(fixture.ritual.clone(), duplicated);
        assert_matches!(
            directory(roster).verify_ritual(fixture.ritual.id).await,
            Err(TesseraError::Invalid { message }) if message.contains("Duplicate")
        );

        let mut bare = fixture.participants();
        bare[2].transcript = None;
        let roster = StaticRoster::new().with_ritual(fixture.ritual.clone(), bare);
        assert_matches!(
            directory(roster).verify_ritual(fixture.ritual.id).await,
            Err(TesseraError::Invalid { message }) if message.contains("transcript")
        );
    }
}
