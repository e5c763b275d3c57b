//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging status/log sinks into the
//! runtime (GUI status panes, log files, metrics). Each subscriber is driven by
//! a dedicated worker fed by a bounded queue owned by the
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Subscribers are purely observational: nothing they do feeds back into
//!   scheduling decisions.
//! - Implementations may be slow; they do **not** block the schedulers nor
//!   other subscribers.
//! - On queue overflow, events for that subscriber are **dropped** and a
//!   `SubscriberOverflow` event is published.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
