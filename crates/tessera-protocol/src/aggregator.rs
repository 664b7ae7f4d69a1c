//! Quorum aggregation of decryption shares
//!
//! ```text
//! Collecting ──(threshold valid shares)──▶ Satisfied
//!     │
//!     └──(nothing outstanding, below threshold)──▶ Failed
//! ```
//!
//! Shares are counted only when their ritual id matches the attempt's.
//! Mismatches and decode failures are recorded per participant and never
//! stop collection of the others.

use std::collections::{BTreeMap, BTreeSet};
use tessera_core::{
    Address, DecryptionResponse, DecryptionShare, ParticipantError, Result, RitualId,
    TesseraError,
};
use tracing::{debug, info, trace, warn};

/// Aggregation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuorumState {
    /// Below threshold with participants still outstanding
    Collecting,
    /// Threshold of valid shares reached
    Satisfied,
    /// Every participant resolved below threshold
    Failed,
}

/// Shares collected for one decryption attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalResult {
    /// Ritual the shares belong to
    pub ritual_id: RitualId,
    /// Threshold the result satisfies
    pub threshold: usize,
    /// Valid shares by participant
    pub shares: BTreeMap<Address, DecryptionShare>,
    /// Failures by participant
    pub errors: BTreeMap<Address, ParticipantError>,
}

impl RetrievalResult {
    /// Shares in participant order, ready for combination
    pub fn decryption_shares(&self) -> Vec<DecryptionShare> {
        self.shares.values().cloned().collect()
    }
}

/// Fan-in accumulator owned by exactly one decryption attempt.
#[derive(Debug)]
pub struct QuorumAggregator {
    ritual_id: RitualId,
    threshold: usize,
    outstanding: BTreeSet<Address>,
    shares: BTreeMap<Address, DecryptionShare>,
    errors: BTreeMap<Address, ParticipantError>,
}

impl QuorumAggregator {
    /// Start collecting for `participants`.
    pub fn new<'a, I>(ritual_id: RitualId, threshold: usize, participants: I) -> Self
    where
        I: IntoIterator<Item = &'a Address>,
    {
        Self {
            ritual_id,
            threshold,
            outstanding: participants.into_iter().cloned().collect(),
            shares: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> QuorumState {
        if self.shares.len() >= self.threshold {
            QuorumState::Satisfied
        } else if self.outstanding.is_empty() {
            QuorumState::Failed
        } else {
            QuorumState::Collecting
        }
    }

    /// Participants that have neither responded nor failed
    pub fn outstanding(&self) -> impl Iterator<Item = &Address> {
        self.outstanding.iter()
    }

    /// Valid shares so far
    pub fn share_count(&self) -> usize {
        self.shares.len()
    }

    /// Record a decoded response.
    ///
    /// Responses from unknown or already resolved participants are ignored.
    pub fn record_response(
        &mut self,
        participant: &Address,
        response: DecryptionResponse,
    ) -> QuorumState {
        if !self.outstanding.remove(participant) {
            warn!(%participant, "Ignoring response from unexpected participant");
            return self.state();
        }
        if response.ritual_id != self.ritual_id {
            warn!(
                %participant,
                expected = %self.ritual_id,
                actual = %response.ritual_id,
                "Discarding share for another ritual"
            );
            self.errors.insert(
                participant.clone(),
                ParticipantError::RitualMismatch {
                    expected: self.ritual_id,
                    actual: response.ritual_id,
                },
            );
            return self.state();
        }

        let before = self.state();
        self.shares.insert(participant.clone(), response.decryption_share);
        let after = self.state();
        trace!(%participant, shares = self.shares.len(), "Recorded decryption share");
        if before != after && after == QuorumState::Satisfied {
            info!(
                ritual = %self.ritual_id,
                threshold = self.threshold,
                "Decryption quorum reached"
            );
        }
        after
    }

    /// Record a failure attributable to one participant.
    pub fn record_error(&mut self, participant: &Address, error: ParticipantError) -> QuorumState {
        if !self.outstanding.remove(participant) {
            warn!(%participant, "Ignoring error from unexpected participant");
            return self.state();
        }
        debug!(%participant, %error, "Participant failed");
        self.errors.insert(participant.clone(), error);
        self.state()
    }

    /// Close collection.
    ///
    /// Anything still outstanding is recorded as a transport failure. Below
    /// threshold the whole attempt fails with [`TesseraError::QuorumNotMet`]
    /// carrying every participant error.
    pub fn finish(mut self) -> Result<RetrievalResult> {
        let reason = match self.state() {
            QuorumState::Satisfied => "Not awaited after quorum was reached",
            _ => "No response from participant",
        };
        for participant in std::mem::take(&mut self.outstanding) {
            self.errors.insert(participant, ParticipantError::transport(reason));
        }

        if self.shares.len() < self.threshold {
            warn!(
                ritual = %self.ritual_id,
                received = self.shares.len(),
                threshold = self.threshold,
                "Decryption quorum not met"
            );
            return Err(TesseraError::QuorumNotMet {
                ritual_id: self.ritual_id,
                threshold: self.threshold,
                received: self.shares.len(),
                errors: self
                    .errors
                    .into_iter()
                    .map(|(address, error)| (address, error.to_string()))
                    .collect(),
            });
        }

        Ok(RetrievalResult {
            ritual_id: self.ritual_id,
            threshold: self.threshold,
            shares: self.shares,
            errors: self.errors,
        })
    }
}
