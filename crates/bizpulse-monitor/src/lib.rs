//! # BizPulse Monitor
//!
//! The operational core: a preflight battery, the periodic check loop, and
//! the one-shot full-member broadcast job.
//!
//! ```text
//! MonitorLoop
//!   ├── Preflight (feature flag, transport, store, cache) — all-or-nothing
//!   ├── startup notice → FanOut (best-effort)
//!   └── every N seconds: poll events → FanOut → CheckCycle record
//!
//! BroadcastJob
//!   └── eligible ads → members → FanOut per ad → BroadcastSummary
//! ```

pub mod broadcast;
pub mod monitor;
pub mod preflight;

pub use broadcast::BroadcastJob;
pub use monitor::{LoopState, MonitorLoop};
pub use preflight::Preflight;
