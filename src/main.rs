//! # BizPulse — business event monitor & notification daemon
//!
//! Usage:
//!   bizpulse monitor                 # Run the check-and-notify daemon
//!   bizpulse broadcast               # One-shot ad broadcast to all members
//!   bizpulse check                   # Run the preflight battery and exit
//!
//! Exit codes: 0 = success / clean stop, 1 = preflight or setup failure.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bizpulse_channels::build_transport;
use bizpulse_core::{BizPulseConfig, ShutdownSignal};
use bizpulse_dispatch::{Dispatcher, FanOut, FanOutConfig};
use bizpulse_monitor::{BroadcastJob, MonitorLoop, Preflight};
use bizpulse_source::HttpEventSource;

#[derive(Parser)]
#[command(
    name = "bizpulse",
    version,
    about = "📡 BizPulse — business event monitor & notification daemon"
)]
struct Cli {
    /// Config file path (default: ~/.bizpulse/config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the periodic monitor loop (daemon)
    Monitor,
    /// Broadcast flagged advertisements to all members, once
    Broadcast,
    /// Run the preflight battery and print the status report
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "bizpulse=debug"
    } else {
        "bizpulse=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => {
            let expanded = shellexpand::tilde(path).to_string();
            BizPulseConfig::load_from(std::path::Path::new(&expanded))
        }
        None => BizPulseConfig::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ {e}");
            std::process::exit(1);
        }
    };

    let transport = match build_transport(&config.channel) {
        Ok(transport) => transport,
        Err(e) => {
            tracing::error!("❌ {e}");
            std::process::exit(1);
        }
    };
    let source = Arc::new(HttpEventSource::new(config.source.clone()));
    let fanout = match FanOut::new(
        Dispatcher::new(transport.clone()),
        FanOutConfig::from(&config.fanout),
    ) {
        Ok(fanout) => fanout,
        Err(e) => {
            tracing::error!("❌ {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Command::Monitor => {
            let shutdown = ShutdownSignal::new();
            spawn_signal_handler(shutdown.clone());

            let preflight =
                Preflight::new(config.monitor.enabled, transport.clone(), source.clone());
            let mut looper =
                MonitorLoop::new(config.monitor.clone(), source, fanout, shutdown);
            looper.set_on_cycle(|cycle| {
                tracing::debug!(
                    sequence = cycle.sequence,
                    processed = cycle.processed,
                    sent = cycle.sent,
                    failed = cycle.failed,
                    duration_ms = cycle.duration_ms,
                    "cycle complete"
                );
            });

            if let Err(e) = looper.run(&preflight).await {
                tracing::error!("❌ {e}");
                std::process::exit(1);
            }
        }
        Command::Broadcast => {
            let job = BroadcastJob::new(source, fanout);
            match job.run().await {
                Ok(result) => {
                    let s = &result.summary;
                    println!("📣 Broadcast complete ({}ms)", result.execution_time_ms);
                    println!("   Ads processed:  {}", s.ads_processed);
                    println!("   Members hit:    {}", s.total_members);
                    println!("   Messages:       {}", s.total_messages);
                    println!("   Delivered:      {}", s.success_count);
                    println!("   Failed:         {}", s.failed_count);
                    for entry in &s.per_ad {
                        println!(
                            "   • {}: {} sent, {} ok, {} failed",
                            entry.ad_id, entry.total_sent, entry.success, entry.failed
                        );
                    }
                    for err in &result.errors {
                        println!("   ⚠️ {err}");
                    }
                }
                Err(e) => {
                    tracing::error!("❌ Broadcast failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::Check => {
            let preflight = Preflight::new(config.monitor.enabled, transport, source);
            let status = preflight.check().await;
            println!("🔎 Preflight report");
            println!("   Feature enabled: {}", status.feature_enabled);
            println!("   Transport:       {}", if status.transport_ok { "ok" } else { "FAIL" });
            println!("   Data store:      {}", if status.data_store_ok { "ok" } else { "FAIL" });
            println!("   Cache:           {}", if status.cache_ok { "ok" } else { "FAIL" });
            if !status.all_ok() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// The handler only sets the flag; the loop observes it at its safe points.
fn spawn_signal_handler(shutdown: ShutdownSignal) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = term.recv() => {}
                    }
                }
                Err(e) => {
                    tracing::warn!("⚠️ SIGTERM handler unavailable: {e}");
                    let _ = ctrl_c.await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }
        tracing::info!("🛑 Shutdown requested — finishing current cycle");
        shutdown.request();
    });
}
