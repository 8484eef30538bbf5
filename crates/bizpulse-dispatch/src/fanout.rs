//! Bounded fan-out with ordered aggregation. Outcomes come back in
//! submission order regardless of completion order, so callers can zip
//! them back to their source entities. Counters are reduced after all
//! tasks finish — no shared mutable counters during the fan-out.

use std::time::Duration;

use futures::StreamExt;
use futures::stream;

use bizpulse_core::config::FanOutSettings;
use bizpulse_core::error::{BizPulseError, Result};
use bizpulse_core::types::{DispatchOutcome, DispatchTask};

use crate::dispatcher::Dispatcher;

/// Fan-out execution parameters.
#[derive(Debug, Clone)]
pub struct FanOutConfig {
    /// Concurrent dispatches. 1 = sequential. 0 is a setup error.
    pub max_concurrency: usize,
    /// Elapsed timeout = failed outcome, siblings keep running.
    pub per_task_timeout: Option<Duration>,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            per_task_timeout: None,
        }
    }
}

impl From<&FanOutSettings> for FanOutConfig {
    fn from(settings: &FanOutSettings) -> Self {
        Self {
            max_concurrency: settings.max_concurrency,
            per_task_timeout: settings.per_task_timeout(),
        }
    }
}

/// Outcomes plus the reduced counts for one batch.
#[derive(Debug)]
pub struct FanOutReport {
    /// Same order as the submitted tasks.
    pub outcomes: Vec<DispatchOutcome>,
    pub success: u32,
    pub failed: u32,
}

impl FanOutReport {
    /// Fraction of successful outcomes; 0.0 for an empty batch.
    pub fn success_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            0.0
        } else {
            f64::from(self.success) / self.outcomes.len() as f64
        }
    }

    fn reduce(outcomes: Vec<DispatchOutcome>) -> Self {
        let success = outcomes.iter().filter(|o| o.success).count() as u32;
        let failed = outcomes.len() as u32 - success;
        Self {
            outcomes,
            success,
            failed,
        }
    }
}

/// Executes a batch of dispatch tasks, each exactly once.
pub struct FanOut {
    dispatcher: Dispatcher,
    config: FanOutConfig,
}

impl std::fmt::Debug for FanOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOut")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FanOut {
    /// Validates the configuration up front; `max_concurrency == 0` is a
    /// contract violation reported before any task runs.
    pub fn new(dispatcher: Dispatcher, config: FanOutConfig) -> Result<Self> {
        if config.max_concurrency == 0 {
            return Err(BizPulseError::Setup(
                "fanout max_concurrency must be at least 1".into(),
            ));
        }
        Ok(Self { dispatcher, config })
    }

    /// Run every task exactly once and reduce the outcomes. An empty batch
    /// yields an empty report with zero counts. Individual failures never
    /// surface as errors.
    pub async fn run(&self, tasks: Vec<DispatchTask>) -> FanOutReport {
        if tasks.is_empty() {
            return FanOutReport::reduce(Vec::new());
        }

        let timeout = self.config.per_task_timeout;
        // buffered() polls up to N dispatches at once but yields results in
        // submission order.
        let outcomes: Vec<DispatchOutcome> = stream::iter(tasks)
            .map(|task| {
                let dispatcher = self.dispatcher.clone();
                async move {
                    match timeout {
                        None => dispatcher.send(task).await,
                        Some(limit) => {
                            match tokio::time::timeout(limit, dispatcher.send(task.clone())).await {
                                Ok(outcome) => outcome,
                                Err(_) => DispatchOutcome::failed(
                                    task,
                                    format!("timed out after {limit:?}"),
                                ),
                            }
                        }
                    }
                }
            })
            .buffered(self.config.max_concurrency)
            .collect()
            .await;

        FanOutReport::reduce(outcomes)
    }
}
