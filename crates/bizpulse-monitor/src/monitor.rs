//! The monitor loop — a fixed-interval check cycle with an explicit state
//! machine. Preflight failure is fatal; everything inside a cycle is
//! isolated: a bad cycle logs, backs off, and the next cycle runs with the
//! next sequence number.

use std::sync::Arc;
use std::time::Duration;

use bizpulse_core::config::MonitorConfig;
use bizpulse_core::error::{BizPulseError, Result};
use bizpulse_core::shutdown::ShutdownSignal;
use bizpulse_core::traits::EventSource;
use bizpulse_core::types::{CheckCycle, DispatchTask, Event, EventCategory, Message};
use bizpulse_dispatch::FanOut;

use crate::preflight::Preflight;

/// Loop lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Initializing,
    Preflighting,
    Running,
    ShuttingDown,
    Stopped,
}

/// Callback invoked with each completed cycle record (the external
/// reporting sink). The loop never depends on it succeeding.
type CycleSink = Arc<dyn Fn(&CheckCycle) + Send + Sync>;

pub struct MonitorLoop {
    config: MonitorConfig,
    source: Arc<dyn EventSource>,
    fanout: FanOut,
    shutdown: ShutdownSignal,
    state: LoopState,
    sequence: u64,
    on_cycle: Option<CycleSink>,
}

impl MonitorLoop {
    pub fn new(
        config: MonitorConfig,
        source: Arc<dyn EventSource>,
        fanout: FanOut,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            config,
            source,
            fanout,
            shutdown,
            state: LoopState::Initializing,
            sequence: 0,
            on_cycle: None,
        }
    }

    /// Attach a reporting sink for completed cycle records.
    pub fn set_on_cycle<F>(&mut self, f: F)
    where
        F: Fn(&CheckCycle) + Send + Sync + 'static,
    {
        self.on_cycle = Some(Arc::new(f));
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Sequence number of the last started cycle (0 before the first).
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Run until shutdown. Returns `Err(Setup)` if preflight refuses —
    /// the caller maps that to exit code 1. A clean shutdown returns Ok.
    pub async fn run(&mut self, preflight: &Preflight) -> Result<()> {
        self.state = LoopState::Preflighting;
        let status = preflight.check().await;
        tracing::info!(
            "🔎 Preflight: feature={} transport={} store={} cache={}",
            status.feature_enabled,
            status.transport_ok,
            status.data_store_ok,
            status.cache_ok
        );
        if !status.all_ok() {
            self.state = LoopState::Stopped;
            return Err(BizPulseError::Setup(
                "preflight failed — fix configuration and restart".into(),
            ));
        }

        // Best-effort: a failed startup notice never blocks entry into Running.
        if self.config.startup_notice {
            self.announce_startup().await;
        }

        self.state = LoopState::Running;
        tracing::info!(
            "⏰ Monitor loop started (check every {}s)",
            self.config.check_interval_secs
        );

        while self.state == LoopState::Running {
            if self.shutdown.is_requested() {
                self.state = LoopState::ShuttingDown;
                break;
            }

            let backoff = match self.run_cycle().await {
                Ok(cycle) => {
                    tracing::info!(
                        "✅ Cycle #{}: processed={} sent={} failed={} ({}ms)",
                        cycle.sequence,
                        cycle.processed,
                        cycle.sent,
                        cycle.failed,
                        cycle.duration_ms
                    );
                    if let Some(sink) = &self.on_cycle {
                        sink(&cycle);
                    }
                    self.config.check_interval()
                }
                Err(e) => {
                    // Cycle-scoped failure: log, short backoff, keep going.
                    tracing::error!("❌ Cycle #{} failed: {e}", self.sequence);
                    self.config.error_backoff()
                }
            };

            self.interruptible_sleep(backoff).await;
            if self.shutdown.is_requested() {
                self.state = LoopState::ShuttingDown;
            }
        }

        self.state = LoopState::Stopped;
        tracing::info!("🛑 Monitor loop stopped after {} cycle(s)", self.sequence);
        Ok(())
    }

    /// One poll-and-dispatch cycle. The sequence number is consumed even
    /// when the cycle fails, so recovered errors leave no gaps.
    async fn run_cycle(&mut self) -> Result<CheckCycle> {
        self.sequence += 1;
        let mut cycle = CheckCycle::begin(self.sequence);
        let started = std::time::Instant::now();

        let events = self.source.poll_new_events().await?;
        let tasks = self.build_tasks(&events);
        cycle.processed = tasks.len() as u32;

        let report = self.fanout.run(tasks).await;
        cycle.sent = report.success;
        cycle.failed = report.failed;
        cycle.duration_ms = started.elapsed().as_millis() as u32;

        Ok(cycle)
    }

    /// One task per (event × target group for its category). A category
    /// with no configured groups is muted.
    fn build_tasks(&self, events: &[Event]) -> Vec<DispatchTask> {
        let mut tasks = Vec::new();
        for event in events {
            for group in self.config.targets.for_category(event.category) {
                tasks.push(DispatchTask::new(
                    group.clone(),
                    event.payload.clone(),
                    event.category,
                ));
            }
        }
        tasks
    }

    async fn announce_startup(&self) {
        let notice = Message::new("📡 BizPulse monitor online");
        let tasks: Vec<DispatchTask> = self
            .config
            .targets
            .for_category(EventCategory::System)
            .iter()
            .map(|group| DispatchTask::new(group.clone(), notice.clone(), EventCategory::System))
            .collect();
        if tasks.is_empty() {
            return;
        }
        let report = self.fanout.run(tasks).await;
        if report.failed > 0 {
            tracing::warn!(
                "⚠️ Startup notice: {} of {} group(s) unreachable",
                report.failed,
                report.failed + report.success
            );
        }
    }

    /// Sleep that ends early on shutdown. The sole guaranteed-interruptible
    /// point; an in-flight cycle always completes first.
    async fn interruptible_sleep(&self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.shutdown.recv() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    use bizpulse_core::config::TargetsConfig;
    use bizpulse_core::traits::Transport;
    use bizpulse_core::types::Advertisement;
    use bizpulse_dispatch::{Dispatcher, FanOut, FanOutConfig};

    /// Records every delivery; optionally rejects recipients ending in "9".
    struct RecordingTransport {
        delivered: Mutex<Vec<String>>,
        flaky: bool,
    }

    impl RecordingTransport {
        fn new(flaky: bool) -> Self {
            Self {
                delivered: Mutex::new(Vec::new()),
                flaky,
            }
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        fn name(&self) -> &str {
            "recording"
        }
        async fn deliver(
            &self,
            recipient_id: &str,
            _m: &Message,
            _c: EventCategory,
        ) -> bizpulse_core::Result<()> {
            self.delivered.lock().unwrap().push(recipient_id.to_string());
            if self.flaky && recipient_id.ends_with('9') {
                return Err(BizPulseError::Channel("rejected".into()));
            }
            Ok(())
        }
        async fn healthcheck(&self) -> bizpulse_core::Result<()> {
            Ok(())
        }
    }

    /// Scripted source: yields one recharge event per poll, errors on the
    /// poll number in `fail_on`, and requests shutdown after `stop_after`
    /// polls.
    struct ScriptedSource {
        polls: AtomicU64,
        fail_on: Option<u64>,
        stop_after: u64,
        shutdown: ShutdownSignal,
    }

    #[async_trait]
    impl EventSource for ScriptedSource {
        async fn poll_new_events(&self) -> bizpulse_core::Result<Vec<Event>> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.stop_after {
                self.shutdown.request();
            }
            if self.fail_on == Some(n) {
                return Err(BizPulseError::Source("db gone away".into()));
            }
            Ok(vec![Event {
                category: EventCategory::Recharge,
                payload: Message::new(format!("deposit #{n}")),
            }])
        }
        async fn list_broadcast_ads(&self) -> bizpulse_core::Result<Vec<Advertisement>> {
            Ok(vec![])
        }
        async fn list_all_members(&self) -> bizpulse_core::Result<Vec<String>> {
            Ok(vec![])
        }
        async fn ping_store(&self) -> bizpulse_core::Result<()> {
            Ok(())
        }
        async fn ping_cache(&self) -> bizpulse_core::Result<()> {
            Ok(())
        }
    }

    fn test_config() -> MonitorConfig {
        MonitorConfig {
            enabled: true,
            check_interval_secs: 0,
            error_backoff_secs: 0,
            startup_notice: true,
            targets: TargetsConfig {
                system: vec!["sys-1".into()],
                recharge: vec!["grp-1".into(), "grp-2".into()],
                ..TargetsConfig::default()
            },
        }
    }

    fn fanout(transport: Arc<dyn Transport>) -> FanOut {
        FanOut::new(Dispatcher::new(transport), FanOutConfig::default()).unwrap()
    }

    /// Source that never gets polled — for preflight-failure coverage.
    struct FailingCacheSource;

    #[async_trait]
    impl EventSource for FailingCacheSource {
        async fn poll_new_events(&self) -> bizpulse_core::Result<Vec<Event>> {
            panic!("loop must not poll after failed preflight");
        }
        async fn list_broadcast_ads(&self) -> bizpulse_core::Result<Vec<Advertisement>> {
            Ok(vec![])
        }
        async fn list_all_members(&self) -> bizpulse_core::Result<Vec<String>> {
            Ok(vec![])
        }
        async fn ping_store(&self) -> bizpulse_core::Result<()> {
            Ok(())
        }
        async fn ping_cache(&self) -> bizpulse_core::Result<()> {
            Err(BizPulseError::Cache("unreachable".into()))
        }
    }

    #[tokio::test]
    async fn test_preflight_failure_is_fatal_and_sends_nothing() {
        let transport = Arc::new(RecordingTransport::new(false));
        let source = Arc::new(FailingCacheSource);
        let shutdown = ShutdownSignal::new();
        let mut looper = MonitorLoop::new(
            test_config(),
            source.clone(),
            fanout(transport.clone()),
            shutdown,
        );
        let preflight = Preflight::new(true, transport.clone(), source);

        let err = looper.run(&preflight).await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(looper.state(), LoopState::Stopped);
        // no startup notice, no cycle dispatches
        assert!(transport.delivered.lock().unwrap().is_empty());
        assert_eq!(looper.sequence(), 0);
    }

    #[tokio::test]
    async fn test_cycles_run_and_shutdown_cleanly() {
        let transport = Arc::new(RecordingTransport::new(false));
        let shutdown = ShutdownSignal::new();
        let source = Arc::new(ScriptedSource {
            polls: AtomicU64::new(0),
            fail_on: None,
            stop_after: 3,
            shutdown: shutdown.clone(),
        });
        let cycles: Arc<Mutex<Vec<CheckCycle>>> = Arc::new(Mutex::new(Vec::new()));

        let mut looper = MonitorLoop::new(
            test_config(),
            source.clone(),
            fanout(transport.clone()),
            shutdown,
        );
        let sink = cycles.clone();
        looper.set_on_cycle(move |c| sink.lock().unwrap().push(c.clone()));
        let preflight = Preflight::new(true, transport.clone(), source);

        looper.run(&preflight).await.unwrap();
        assert_eq!(looper.state(), LoopState::Stopped);

        let recorded = cycles.lock().unwrap();
        assert_eq!(recorded.len(), 3);
        // sequence numbers 1..=3, each event fanned out to both recharge groups
        for (i, cycle) in recorded.iter().enumerate() {
            assert_eq!(cycle.sequence, i as u64 + 1);
            assert_eq!(cycle.processed, 2);
            assert_eq!(cycle.sent + cycle.failed, cycle.processed);
        }
        // startup notice went to the system group first
        assert_eq!(transport.delivered.lock().unwrap()[0], "sys-1");
    }

    #[tokio::test]
    async fn test_poll_error_is_isolated_no_sequence_gap() {
        let transport = Arc::new(RecordingTransport::new(false));
        let shutdown = ShutdownSignal::new();
        let source = Arc::new(ScriptedSource {
            polls: AtomicU64::new(0),
            fail_on: Some(2),
            stop_after: 4,
            shutdown: shutdown.clone(),
        });
        let cycles: Arc<Mutex<Vec<CheckCycle>>> = Arc::new(Mutex::new(Vec::new()));

        let mut looper = MonitorLoop::new(
            test_config(),
            source.clone(),
            fanout(transport.clone()),
            shutdown,
        );
        let sink = cycles.clone();
        looper.set_on_cycle(move |c| sink.lock().unwrap().push(c.clone()));
        let preflight = Preflight::new(true, transport.clone(), source);

        looper.run(&preflight).await.unwrap();

        // cycle 2 errored and was not reported; cycles 1, 3, 4 completed.
        let sequences: Vec<u64> = cycles.lock().unwrap().iter().map(|c| c.sequence).collect();
        assert_eq!(sequences, vec![1, 3, 4]);
        // the loop consumed sequence 2 and kept going — no crash, no reuse
        assert_eq!(looper.sequence(), 4);
    }

    #[tokio::test]
    async fn test_failed_startup_notice_does_not_block_running() {
        // system group id ends in "9", so the flaky transport rejects the
        // startup notice — cycles must still run and the loop exits cleanly
        let transport = Arc::new(RecordingTransport::new(true));
        let shutdown = ShutdownSignal::new();
        let source = Arc::new(ScriptedSource {
            polls: AtomicU64::new(0),
            fail_on: None,
            stop_after: 2,
            shutdown: shutdown.clone(),
        });
        let cycles: Arc<Mutex<Vec<CheckCycle>>> = Arc::new(Mutex::new(Vec::new()));

        let mut config = test_config();
        config.targets.system = vec!["sys-9".into()];

        let mut looper =
            MonitorLoop::new(config, source.clone(), fanout(transport.clone()), shutdown);
        let sink = cycles.clone();
        looper.set_on_cycle(move |c| sink.lock().unwrap().push(c.clone()));
        let preflight = Preflight::new(true, transport.clone(), source);

        looper.run(&preflight).await.unwrap();
        assert_eq!(looper.state(), LoopState::Stopped);

        // the notice was attempted and rejected, then the loop kept going
        assert_eq!(transport.delivered.lock().unwrap()[0], "sys-9");
        let recorded = cycles.lock().unwrap();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].sequence, 1);
    }

    #[tokio::test]
    async fn test_delivery_failure_counted_not_fatal() {
        let transport = Arc::new(RecordingTransport::new(true));
        let shutdown = ShutdownSignal::new();
        let source = Arc::new(ScriptedSource {
            polls: AtomicU64::new(0),
            fail_on: None,
            stop_after: 1,
            shutdown: shutdown.clone(),
        });
        let cycles: Arc<Mutex<Vec<CheckCycle>>> = Arc::new(Mutex::new(Vec::new()));

        let mut config = test_config();
        config.targets.recharge = vec!["grp-1".into(), "grp-9".into()];
        config.startup_notice = false;

        let mut looper =
            MonitorLoop::new(config, source.clone(), fanout(transport.clone()), shutdown);
        let sink = cycles.clone();
        looper.set_on_cycle(move |c| sink.lock().unwrap().push(c.clone()));
        let preflight = Preflight::new(true, transport.clone(), source);

        looper.run(&preflight).await.unwrap();

        let recorded = cycles.lock().unwrap();
        assert_eq!(recorded[0].processed, 2);
        assert_eq!(recorded[0].sent, 1);
        assert_eq!(recorded[0].failed, 1);
        // both recipients were still attempted
        assert_eq!(transport.delivered.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_during_sleep_stops_before_next_cycle() {
        let transport = Arc::new(RecordingTransport::new(false));
        let shutdown = ShutdownSignal::new();
        let source = Arc::new(ScriptedSource {
            polls: AtomicU64::new(0),
            fail_on: None,
            stop_after: 1,
            shutdown: shutdown.clone(),
        });

        let mut config = test_config();
        config.check_interval_secs = 3600; // sleep would block for an hour
        config.startup_notice = false;

        let mut looper =
            MonitorLoop::new(config, source.clone(), fanout(transport.clone()), shutdown);
        let preflight = Preflight::new(true, transport.clone(), source.clone());

        // the source requests shutdown during cycle 1; the sleep must yield
        tokio::time::timeout(Duration::from_secs(5), looper.run(&preflight))
            .await
            .expect("loop must not sleep through shutdown")
            .unwrap();
        assert_eq!(looper.state(), LoopState::Stopped);
        assert_eq!(source.polls.load(Ordering::SeqCst), 1);
    }
}
