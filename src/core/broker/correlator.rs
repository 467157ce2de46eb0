//! Request correlation
//!
//! Tracks in-flight cross-context requests by id, resolves or rejects them
//! when a matching response arrives, and enforces a per-request timeout.
//! One owned instance per execution context; responses are matched purely by
//! `request_id`, never by arrival order.

use super::envelope::{Method, RequestEnvelope, ResponseEnvelope};
use super::transport::Transport;
use crate::shared::constants::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::shared::error::{WalletError, WalletResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

enum Outcome {
    Result(Value),
    Error(WalletError),
}

struct PendingRequest {
    method: Method,
    created_at: Instant,
    tx: oneshot::Sender<Outcome>,
}

/// Correlates outbound requests with their asynchronous responses.
pub struct RequestCorrelator {
    transport: Arc<dyn Transport>,
    pending: Mutex<HashMap<String, PendingRequest>>,
    default_timeout: Duration,
}

impl RequestCorrelator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_default_timeout(transport, Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS))
    }

    pub fn with_default_timeout(transport: Arc<dyn Transport>, default_timeout: Duration) -> Self {
        Self {
            transport,
            pending: Mutex::new(HashMap::new()),
            default_timeout,
        }
    }

    /// Dispatch a request and await its response.
    ///
    /// The pending entry is destroyed exactly once: by the matching response
    /// or by timeout expiry, whichever happens first. The losing path becomes
    /// a no-op.
    pub async fn send(
        &self,
        envelope: RequestEnvelope,
        timeout: Option<Duration>,
    ) -> WalletResult<Value> {
        let id = envelope.id.clone();
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending();
            if pending.contains_key(&id) {
                return Err(WalletError::internal(format!("duplicate request id {}", id)));
            }
            pending.insert(
                id.clone(),
                PendingRequest {
                    method: envelope.method,
                    created_at: Instant::now(),
                    tx,
                },
            );
        }

        let wire = match serde_json::to_value(&envelope) {
            Ok(wire) => wire,
            Err(e) => {
                self.remove(&id);
                return Err(e.into());
            }
        };
        if let Err(e) = self.transport.send(wire).await {
            self.remove(&id);
            return Err(e);
        }

        let duration = timeout.unwrap_or(self.default_timeout);
        match tokio::time::timeout(duration, rx).await {
            Ok(Ok(Outcome::Result(value))) => Ok(value),
            Ok(Ok(Outcome::Error(error))) => Err(error),
            Ok(Err(_)) => Err(WalletError::unknown(
                "response channel closed with neither result nor error",
            )),
            Err(_elapsed) => {
                if let Some(entry) = self.remove(&id) {
                    log::debug!(
                        "request {} ({}) timed out after {:?}",
                        id,
                        entry.method.wire_name(),
                        entry.created_at.elapsed()
                    );
                }
                Err(WalletError::canceled(format!(
                    "request {} timed out after {:?}",
                    id, duration
                )))
            }
        }
    }

    /// Feed a response arriving from the far side.
    ///
    /// Responses with no matching pending entry are dropped silently; the
    /// requester may already have timed out or been torn down.
    pub fn on_response(&self, response: &ResponseEnvelope) {
        let Some(entry) = self.remove(&response.request_id) else {
            log::debug!(
                "dropping response for unknown request {}",
                response.request_id
            );
            return;
        };

        let outcome = match (&response.result, &response.error) {
            (_, Some(error)) => Outcome::Error(error.clone().into_error()),
            (Some(value), None) => Outcome::Result(value.clone()),
            (None, None) => Outcome::Error(WalletError::unknown(
                "response carried neither result nor error",
            )),
        };
        // The receiver may already be gone if the timeout won the race.
        let _ = entry.tx.send(outcome);
    }

    /// Reject every in-flight request, e.g. when this context shuts down, so
    /// remote callers are not left hanging.
    pub fn reject_all(&self, error: &WalletError) {
        let drained: Vec<(String, PendingRequest)> = self.pending().drain().collect();
        for (id, entry) in drained {
            log::debug!("rejecting pending request {} ({})", id, entry.method.wire_name());
            let _ = entry.tx.send(Outcome::Error(error.clone()));
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending().len()
    }

    fn remove(&self, id: &str) -> Option<PendingRequest> {
        self.pending().remove(id)
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<String, PendingRequest>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
