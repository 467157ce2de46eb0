//! Transport seam
//!
//! Cross-context messaging is injected behind this trait so the correlator
//! and adapter can be exercised without any browser runtime.

use crate::shared::error::WalletResult;
use async_trait::async_trait;
use serde_json::Value;

/// One-way message channel to another execution context.
///
/// Delivery is asynchronous; messages may be dropped by the far side, and
/// ordering is only guaranteed per channel.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: Value) -> WalletResult<()>;
}
