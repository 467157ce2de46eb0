//! Cross-context request broker
//!
//! Correlates requests and responses flowing between the webpage, the
//! content-script relay, and the privileged background/popup context. Each
//! context owns one broker instance; nothing here is global.

pub mod adapter;
pub mod correlator;
pub mod envelope;
pub mod transport;

// Re-export all public items from submodules
pub use adapter::*;
pub use correlator::*;
pub use envelope::*;
pub use transport::*;

use crate::shared::error::WalletResult;
use crate::shared::types::PageMetadata;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Services normalized requests in the privileged context.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, envelope: &RequestEnvelope) -> WalletResult<Value>;
}

/// One context's entry point for inbound and outbound traffic.
pub struct RequestBroker {
    adapter: Arc<ProtocolAdapter>,
    correlator: Arc<RequestCorrelator>,
    transport: Arc<dyn Transport>,
    handler: Arc<dyn RequestHandler>,
}

impl RequestBroker {
    pub fn new(
        capabilities: ContextCapabilities,
        transport: Arc<dyn Transport>,
        handler: Arc<dyn RequestHandler>,
    ) -> Self {
        Self {
            adapter: Arc::new(ProtocolAdapter::new(capabilities)),
            correlator: Arc::new(RequestCorrelator::new(transport.clone())),
            transport,
            handler,
        }
    }

    /// Feed a raw message arriving from another context. Fire-and-forget:
    /// requests are dispatched asynchronously and their responses sent back
    /// over the transport; responses resolve this context's own pending
    /// requests. Send failures on this path are best-effort and only logged.
    ///
    /// Must be called from within a tokio runtime.
    pub fn handle_inbound(&self, raw: Value, page: PageMetadata) {
        if let Some(response) = self.adapter.translate_inbound_response(&raw) {
            self.correlator.on_response(&response);
            return;
        }

        let Some(inbound) = self.adapter.translate_inbound(&raw, &page) else {
            log::debug!("ignoring message not addressed to this context");
            return;
        };

        match inbound {
            Inbound::Rejection(reply) => {
                let transport = self.transport.clone();
                tokio::spawn(async move {
                    if let Err(e) = transport.send(reply).await {
                        log::warn!("failed to send rejection: {}", e);
                    }
                });
            }
            Inbound::Request(request) => {
                let adapter = self.adapter.clone();
                let transport = self.transport.clone();
                let handler = self.handler.clone();
                tokio::spawn(async move {
                    let response = match handler.handle(&request.envelope).await {
                        Ok(result) => ResponseEnvelope::success(&request.envelope, result),
                        Err(error) => {
                            log::debug!(
                                "request {} ({}) failed: {}",
                                request.envelope.id,
                                request.envelope.method.wire_name(),
                                error
                            );
                            ResponseEnvelope::failure(&request.envelope, &error)
                        }
                    };
                    match adapter.translate_outbound(&response, request.protocol) {
                        Ok(raw) => {
                            if let Err(e) = transport.send(raw).await {
                                log::warn!("failed to send response: {}", e);
                            }
                        }
                        Err(e) => log::warn!("failed to shape response: {}", e),
                    }
                });
            }
        }
    }

    /// Send a request to another context and await its result.
    pub async fn send_outbound(
        &self,
        envelope: RequestEnvelope,
        timeout: Option<Duration>,
    ) -> WalletResult<Value> {
        self.correlator.send(envelope, timeout).await
    }

    /// Reject everything still in flight, e.g. on context teardown.
    pub fn shutdown(&self, error: &crate::shared::error::WalletError) {
        self.correlator.reject_all(error);
    }

    pub fn pending_len(&self) -> usize {
        self.correlator.pending_len()
    }
}
