//! Trait seams to the outside world. Concrete transports live in
//! `bizpulse-channels`; the backend client lives in `bizpulse-source`.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Advertisement, Event, EventCategory, Message};

/// A chat delivery channel. Implementations hold a pooled HTTP client and
/// keep no per-call mutable state, so one instance can be shared across
/// concurrent dispatch workers behind an `Arc`.
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver one message to one recipient. Exactly one attempt; retry
    /// policy (if any) belongs to the caller. The category is carried for
    /// transports whose wire format includes it.
    async fn deliver(
        &self,
        recipient_id: &str,
        message: &Message,
        category: EventCategory,
    ) -> Result<()>;

    /// Cheap reachability probe used by preflight.
    async fn healthcheck(&self) -> Result<()>;
}

impl std::fmt::Debug for dyn Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").field("name", &self.name()).finish()
    }
}

/// The business data source. All methods are idempotent reads; checkpoint
/// advancement ("what counts as new since last check") is the backend's
/// responsibility, not the monitor's.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Newly-detected events across all monitored categories.
    async fn poll_new_events(&self) -> Result<Vec<Event>>;

    /// Advertisements flagged for full-member broadcast, in stable order.
    async fn list_broadcast_ads(&self) -> Result<Vec<Advertisement>>;

    /// Ids of every active member.
    async fn list_all_members(&self) -> Result<Vec<String>>;

    /// Data-store reachability probe.
    async fn ping_store(&self) -> Result<()>;

    /// Cache reachability probe.
    async fn ping_cache(&self) -> Result<()>;
}
