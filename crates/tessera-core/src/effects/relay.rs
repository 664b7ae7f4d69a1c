//! Relay (broker) effect
//!
//! The relay takes one sealed request per participant and hands each
//! participant's outcome to a [`RelaySink`] as it arrives. Its transport is
//! not defined here.

use crate::errors::Result;
use crate::identifiers::Address;
use crate::messages::{EncryptedDecryptionRequest, EncryptedDecryptionResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of one relay round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayOutcome {
    /// Sealed responses by participant
    pub responses: BTreeMap<Address, EncryptedDecryptionResponse>,
    /// Failures by participant
    pub errors: BTreeMap<Address, String>,
}

/// Receives participant outcomes while a relay round is in flight.
pub trait RelaySink: Send {
    /// Record one participant's outcome.
    ///
    /// Returns `true` once no further outcomes are needed.
    fn record(
        &mut self,
        participant: Address,
        outcome: Result<EncryptedDecryptionResponse>,
    ) -> bool;
}

/// Counts raw responses up to a threshold.
struct ThresholdSink {
    threshold: usize,
    outcome: RelayOutcome,
}

impl RelaySink for ThresholdSink {
    fn record(
        &mut self,
        participant: Address,
        outcome: Result<EncryptedDecryptionResponse>,
    ) -> bool {
        match outcome {
            Ok(response) => {
                self.outcome.responses.insert(participant, response);
            }
            Err(err) => {
                self.outcome.errors.insert(participant, err.to_string());
            }
        }
        self.outcome.responses.len() >= self.threshold
    }
}

/// Broker interface for a whole decryption round
#[async_trait]
pub trait RelayEffects: Send + Sync {
    /// Deliver every request, feeding outcomes to `sink` in arrival order.
    ///
    /// Calls still outstanding when `sink` reports it is done are abandoned
    /// and never reported.
    async fn collect(
        &self,
        requests: BTreeMap<Address, EncryptedDecryptionRequest>,
        sink: &mut dyn RelaySink,
    ) -> Result<()>;

    /// Deliver every request and collect responses until `threshold` of them
    /// arrived.
    ///
    /// Participants abandoned after that are reported in `errors`.
    async fn threshold_decrypt(
        &self,
        requests: BTreeMap<Address, EncryptedDecryptionRequest>,
        threshold: usize,
    ) -> Result<RelayOutcome> {
        let requested: Vec<Address> = requests.keys().cloned().collect();
        let mut sink = ThresholdSink {
            threshold,
            outcome: RelayOutcome::default(),
        };
        self.collect(requests, &mut sink).await?;

        let mut outcome = sink.outcome;
        for address in requested {
            if !outcome.responses.contains_key(&address) {
                outcome
                    .errors
                    .entry(address)
                    .or_insert_with(|| "Abandoned after threshold was reached".to_string());
            }
        }
        Ok(outcome)
    }
}

/// Point-to-point delivery to a single participant
#[async_trait]
pub trait NodeTransport: Send + Sync {
    /// Send one request and wait for its response
    async fn send(
        &self,
        node: &Address,
        request: EncryptedDecryptionRequest,
    ) -> Result<EncryptedDecryptionResponse>;
}

/// Participant-side handler for one sealed request
///
/// Implemented by decryption nodes; transports hand requests to it.
#[async_trait]
pub trait DecryptionService: Send + Sync {
    /// Address the service answers as
    fn address(&self) -> &Address;

    /// Process one sealed request into a sealed response
    async fn handle(
        &self,
        request: EncryptedDecryptionRequest,
    ) -> Result<EncryptedDecryptionResponse>;
}
