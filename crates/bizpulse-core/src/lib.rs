//! # BizPulse Core
//!
//! Shared foundation for the BizPulse monitor daemon: configuration,
//! error taxonomy, the event/dispatch data model, and the trait seams
//! (`Transport`, `EventSource`) the other crates plug into.

pub mod config;
pub mod error;
pub mod shutdown;
pub mod traits;
pub mod types;

pub use config::BizPulseConfig;
pub use error::{BizPulseError, Result};
pub use shutdown::ShutdownSignal;
pub use traits::{EventSource, Transport};
pub use types::{
    AdBreakdown, Advertisement, BroadcastResult, BroadcastSummary, CheckCycle, DispatchOutcome,
    DispatchTask, Event, EventCategory, HealthStatus, Message,
};
