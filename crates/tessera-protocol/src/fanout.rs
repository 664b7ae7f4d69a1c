//! Fan-out relay over a point-to-point transport
//!
//! One task per participant, joined as a set. Each call is one-shot: a
//! timeout or transport error becomes that participant's outcome and nothing
//! is retried. Outcomes reach the sink as they complete; once the sink has
//! what it needs, the remaining calls are aborted.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tessera_core::{
    Address, EncryptedDecryptionRequest, NodeTransport, RelayEffects, RelaySink, Result,
    RetrievalConfig, TesseraError,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Relay that calls every participant directly.
pub struct FanoutRelay<T: NodeTransport + 'static> {
    transport: Arc<T>,
    request_timeout: Duration,
    limit: Option<Arc<Semaphore>>,
}

impl<T: NodeTransport + 'static> FanoutRelay<T> {
    /// Relay with per-call timeout and concurrency limit from `config`
    pub fn new(transport: Arc<T>, config: &RetrievalConfig) -> Self {
        let limit = match config.max_concurrent_requests {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };
        Self {
            transport,
            request_timeout: config.request_timeout(),
            limit,
        }
    }
}

#[async_trait]
impl<T: NodeTransport + 'static> RelayEffects for FanoutRelay<T> {
    async fn collect(
        &self,
        requests: BTreeMap<Address, EncryptedDecryptionRequest>,
        sink: &mut dyn RelaySink,
    ) -> Result<()> {
        debug!(participants = requests.len(), "Dispatching decryption requests");
        let mut pending: BTreeSet<Address> = requests.keys().cloned().collect();
        let mut tasks = JoinSet::new();

        for (address, request) in requests {
            let transport = self.transport.clone();
            let limit = self.limit.clone();
            let timeout = self.request_timeout;
            tasks.spawn(async move {
                let _permit = match limit {
                    Some(semaphore) => match semaphore.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(_) => {
                            let err = TesseraError::internal("Request limiter closed");
                            return (address, Err(err));
                        }
                    },
                    None => None,
                };
                let call = tokio::time::timeout(timeout, transport.send(&address, request));
                let result = match call.await {
                    Ok(result) => result,
                    Err(_) => Err(TesseraError::network(format!(
                        "Timed out after {}ms",
                        timeout.as_millis()
                    ))),
                };
                (address, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (address, result) = match joined {
                Ok(completed) => completed,
                Err(join_err) => {
                    warn!(error = %join_err, "Participant task aborted");
                    continue;
                }
            };
            pending.remove(&address);
            if let Err(err) = &result {
                debug!(participant = %address, error = %err, "Participant call failed");
            }
            if sink.record(address, result) {
                if !pending.is_empty() {
                    debug!(abandoned = pending.len(), "Collection complete; aborting calls");
                }
                tasks.abort_all();
                return Ok(());
            }
        }

        for address in pending {
            let err = TesseraError::internal("Participant task aborted");
            if sink.record(address, Err(err)) {
                break;
            }
        }
        debug!("Fan-out complete");
        Ok(())
    }
}
