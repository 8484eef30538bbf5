//! BizPulse configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BizPulseError, Result};
use crate::types::EventCategory;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BizPulseConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub fanout: FanOutSettings,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

impl BizPulseConfig {
    /// Load config from the default path (~/.bizpulse/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BizPulseError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| BizPulseError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bizpulse")
            .join("config.toml")
    }
}

/// Monitor loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Master feature flag — preflight refuses to start when false.
    #[serde(default = "bool_true")]
    pub enabled: bool,
    /// Seconds between check cycles.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    /// Backoff after a failed cycle, capped at 30s.
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,
    /// Send a startup notice to the system groups when the loop starts.
    #[serde(default = "bool_true")]
    pub startup_notice: bool,
    #[serde(default)]
    pub targets: TargetsConfig,
}

fn bool_true() -> bool {
    true
}
fn default_check_interval() -> u64 {
    30
}
fn default_error_backoff() -> u64 {
    30
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_secs: default_check_interval(),
            error_backoff_secs: default_error_backoff(),
            startup_notice: true,
            targets: TargetsConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Error backoff never exceeds the check interval or 30s.
    pub fn error_backoff(&self) -> Duration {
        let capped = self.error_backoff_secs.min(self.check_interval_secs).min(30);
        Duration::from_secs(capped)
    }
}

/// Chat group ids per event category. An empty list mutes the category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetsConfig {
    #[serde(default)]
    pub system: Vec<String>,
    #[serde(default)]
    pub recharge: Vec<String>,
    #[serde(default)]
    pub withdraw: Vec<String>,
    #[serde(default)]
    pub redpacket: Vec<String>,
    #[serde(default)]
    pub advertisement: Vec<String>,
}

impl TargetsConfig {
    pub fn for_category(&self, category: EventCategory) -> &[String] {
        match category {
            EventCategory::System => &self.system,
            EventCategory::Recharge => &self.recharge,
            EventCategory::Withdraw => &self.withdraw,
            EventCategory::RedPacket => &self.redpacket,
            EventCategory::Advertisement => &self.advertisement,
        }
    }
}

/// Fan-out worker settings shared by the monitor and the broadcast job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanOutSettings {
    /// Concurrent dispatches. 1 = sequential. 0 is rejected at setup.
    #[serde(default = "default_concurrency")]
    pub max_concurrency: usize,
    /// Per-task timeout in seconds. 0 = none.
    #[serde(default)]
    pub per_task_timeout_secs: u64,
}

fn default_concurrency() -> usize {
    1
}

impl Default for FanOutSettings {
    fn default() -> Self {
        Self {
            max_concurrency: default_concurrency(),
            per_task_timeout_secs: 0,
        }
    }
}

impl FanOutSettings {
    pub fn per_task_timeout(&self) -> Option<Duration> {
        (self.per_task_timeout_secs > 0).then(|| Duration::from_secs(self.per_task_timeout_secs))
    }
}

/// Channel configuration — which transport carries notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// "telegram" or "webhook".
    #[serde(default = "default_transport")]
    pub transport: String,
    #[serde(default)]
    pub telegram: Option<TelegramChannelConfig>,
    #[serde(default)]
    pub webhook: Option<WebhookChannelConfig>,
}

fn default_transport() -> String {
    "telegram".into()
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            telegram: None,
            webhook: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChannelConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    pub bot_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookChannelConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    pub url: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

/// Business backend API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".into()
}
fn default_source_timeout() -> u64 {
    10
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: String::new(),
            timeout_secs: default_source_timeout(),
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
