//! One task, one transport attempt, one outcome. Transport failures are
//! captured into the outcome — nothing crosses this boundary as an error.

use std::sync::Arc;

use bizpulse_core::traits::Transport;
use bizpulse_core::types::{DispatchOutcome, DispatchTask};

/// Sends a single notification through the shared transport. Clonable and
/// safe to use from concurrent workers; the transport holds the only shared
/// state (a pooled HTTP client).
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Exactly one delivery attempt. No retries here — retry policy, if
    /// any, belongs to the caller.
    pub async fn send(&self, task: DispatchTask) -> DispatchOutcome {
        match self
            .transport
            .deliver(&task.recipient_id, &task.payload, task.category)
            .await
        {
            Ok(()) => {
                tracing::debug!(
                    "✅ {} → {} delivered",
                    task.category,
                    task.recipient_id
                );
                DispatchOutcome::ok(task)
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ {} → {} failed: {e}",
                    task.category,
                    task.recipient_id
                );
                DispatchOutcome::failed(task, e.to_string())
            }
        }
    }
}
