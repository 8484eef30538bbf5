//! Data model — events coming in from the business backend, dispatch tasks
//! going out to chat groups, and the per-cycle / per-broadcast accounting
//! records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Business event category the monitor watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Operational/system notices (startup, config changes).
    System,
    /// Member deposit / recharge completed.
    Recharge,
    /// Member withdrawal request or completion.
    Withdraw,
    /// Red-packet claim.
    #[serde(rename = "redpacket")]
    RedPacket,
    /// Advertisement trigger.
    Advertisement,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::System => write!(f, "system"),
            EventCategory::Recharge => write!(f, "recharge"),
            EventCategory::Withdraw => write!(f, "withdraw"),
            EventCategory::RedPacket => write!(f, "redpacket"),
            EventCategory::Advertisement => write!(f, "advertisement"),
        }
    }
}

/// A display-ready notification payload. Formatting happens upstream (the
/// backend hands over final text); the core only moves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A newly-detected business event from the data-source poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub category: EventCategory,
    pub payload: Message,
}

/// One send attempt: deliver `payload` to `recipient_id`. Ephemeral —
/// built, dispatched once, and folded into a `DispatchOutcome`.
#[derive(Debug, Clone)]
pub struct DispatchTask {
    /// Chat group id (or member id for broadcasts).
    pub recipient_id: String,
    pub payload: Message,
    pub category: EventCategory,
}

impl DispatchTask {
    pub fn new(recipient_id: impl Into<String>, payload: Message, category: EventCategory) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            payload,
            category,
        }
    }
}

/// The result of exactly one dispatch attempt. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub task: DispatchTask,
    pub success: bool,
    pub error_detail: Option<String>,
}

impl DispatchOutcome {
    pub fn ok(task: DispatchTask) -> Self {
        Self {
            task,
            success: true,
            error_detail: None,
        }
    }

    pub fn failed(task: DispatchTask, detail: impl Into<String>) -> Self {
        Self {
            task,
            success: false,
            error_detail: Some(detail.into()),
        }
    }
}

/// Accounting record for one monitor cycle. Lives in memory and the log
/// only — nothing persists across restarts.
#[derive(Debug, Clone, Serialize)]
pub struct CheckCycle {
    /// Strictly increasing from 1, no gaps, even across recovered errors.
    pub sequence: u64,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u32,
    /// Events detected this cycle (= dispatch tasks built).
    pub processed: u32,
    pub sent: u32,
    pub failed: u32,
}

impl CheckCycle {
    pub fn begin(sequence: u64) -> Self {
        Self {
            sequence,
            started_at: Utc::now(),
            duration_ms: 0,
            processed: 0,
            sent: 0,
            failed: 0,
        }
    }
}

/// Preflight status report. Computed fresh on every call, never cached.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthStatus {
    pub feature_enabled: bool,
    pub transport_ok: bool,
    pub data_store_ok: bool,
    pub cache_ok: bool,
}

impl HealthStatus {
    /// The loop refuses to start unless all four probes pass.
    pub fn all_ok(&self) -> bool {
        self.feature_enabled && self.transport_ok && self.data_store_ok && self.cache_ok
    }
}

/// An advertisement flagged for full-member broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advertisement {
    pub id: String,
    pub title: String,
    /// Display-ready broadcast text.
    pub content: String,
}

/// Per-advertisement counts inside a broadcast run.
#[derive(Debug, Clone, Serialize)]
pub struct AdBreakdown {
    pub ad_id: String,
    pub total_sent: u32,
    pub success: u32,
    pub failed: u32,
}

/// Aggregate counts for one broadcast run.
///
/// `total_members` is the sum of per-ad targets (recipients touched), not a
/// de-duplicated member count — an ad list of 3 ads over the same 100
/// members reports 300. `per_ad` preserves ad iteration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BroadcastSummary {
    pub ads_processed: u32,
    pub total_members: u32,
    pub total_messages: u32,
    pub success_count: u32,
    pub failed_count: u32,
    pub per_ad: Vec<AdBreakdown>,
}

impl BroadcastSummary {
    /// Fold one ad's counts into the totals, keeping
    /// `total_messages == success_count + failed_count`.
    pub fn absorb(&mut self, breakdown: AdBreakdown) {
        self.ads_processed += 1;
        self.total_members += breakdown.total_sent;
        self.total_messages += breakdown.total_sent;
        self.success_count += breakdown.success;
        self.failed_count += breakdown.failed;
        self.per_ad.push(breakdown);
    }
}

/// Full result of one broadcast run, including entity-scoped errors that
/// were isolated rather than raised.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastResult {
    pub summary: BroadcastSummary,
    pub errors: Vec<String>,
    pub execution_time_ms: u64,
}
