//! Bulk broadcast job — push every flagged advertisement to the full member
//! set, once, synchronously, with per-ad accounting. One broken ad never
//! aborts the run; its error lands in the result's error list.

use std::sync::Arc;

use bizpulse_core::error::Result;
use bizpulse_core::traits::EventSource;
use bizpulse_core::types::{
    AdBreakdown, Advertisement, BroadcastResult, BroadcastSummary, DispatchTask, EventCategory,
    Message,
};
use bizpulse_dispatch::FanOut;

pub struct BroadcastJob {
    source: Arc<dyn EventSource>,
    fanout: FanOut,
}

impl BroadcastJob {
    pub fn new(source: Arc<dyn EventSource>, fanout: FanOut) -> Self {
        Self { source, fanout }
    }

    /// Run the broadcast to completion. Errs only when the eligible-ad
    /// query itself fails (nothing was attempted); per-ad failures are
    /// collected into `errors` and the run continues.
    pub async fn run(&self) -> Result<BroadcastResult> {
        let started = std::time::Instant::now();
        let ads = self.source.list_broadcast_ads().await?;

        let mut summary = BroadcastSummary::default();
        let mut errors = Vec::new();

        if ads.is_empty() {
            tracing::info!("📭 No advertisements flagged for broadcast");
            return Ok(BroadcastResult {
                summary,
                errors,
                execution_time_ms: started.elapsed().as_millis() as u64,
            });
        }

        tracing::info!("📣 Broadcasting {} advertisement(s)", ads.len());
        for ad in &ads {
            match self.broadcast_one(ad).await {
                Ok(breakdown) => {
                    tracing::info!(
                        "✅ Ad '{}' ({}): sent={} ok={} failed={}",
                        ad.title,
                        ad.id,
                        breakdown.total_sent,
                        breakdown.success,
                        breakdown.failed
                    );
                    summary.absorb(breakdown);
                }
                Err(e) => {
                    tracing::error!("❌ Ad '{}' ({}) failed: {e}", ad.title, ad.id);
                    errors.push(format!("ad {}: {e}", ad.id));
                }
            }
        }

        Ok(BroadcastResult {
            summary,
            errors,
            execution_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Resolve the member set and fan one ad out to all of them. The member
    /// query failing makes this ad's entry an error; delivery failures are
    /// just counts.
    async fn broadcast_one(&self, ad: &Advertisement) -> Result<AdBreakdown> {
        let members = self.source.list_all_members().await?;
        let payload = Message::new(ad.content.clone());
        let tasks: Vec<DispatchTask> = members
            .iter()
            .map(|member| {
                DispatchTask::new(member.clone(), payload.clone(), EventCategory::Advertisement)
            })
            .collect();

        let report = self.fanout.run(tasks).await;
        Ok(AdBreakdown {
            ad_id: ad.id.clone(),
            total_sent: members.len() as u32,
            success: report.success,
            failed: report.failed,
        })
    }
}
