//! # BizPulse Channels
//! Chat transport implementations behind the `Transport` trait.

pub mod telegram;
pub mod webhook;

use std::sync::Arc;

use bizpulse_core::config::ChannelConfig;
use bizpulse_core::error::{BizPulseError, Result};
use bizpulse_core::traits::Transport;

pub use telegram::TelegramTransport;
pub use webhook::WebhookTransport;

/// Build the configured transport. Called once at startup.
pub fn build_transport(config: &ChannelConfig) -> Result<Arc<dyn Transport>> {
    match config.transport.as_str() {
        "telegram" => {
            let tg = config
                .telegram
                .as_ref()
                .filter(|c| c.enabled && !c.bot_token.is_empty())
                .ok_or_else(|| {
                    BizPulseError::Setup("Telegram transport selected but not configured".into())
                })?;
            Ok(Arc::new(TelegramTransport::new(tg.bot_token.clone())))
        }
        "webhook" => {
            let wh = config
                .webhook
                .as_ref()
                .filter(|c| c.enabled && !c.url.is_empty())
                .ok_or_else(|| {
                    BizPulseError::Setup("Webhook transport selected but not configured".into())
                })?;
            Ok(Arc::new(WebhookTransport::new(
                wh.url.clone(),
                wh.headers.clone(),
            )))
        }
        other => Err(BizPulseError::Setup(format!("Unknown transport: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizpulse_core::config::{TelegramChannelConfig, WebhookChannelConfig};

    #[test]
    fn test_build_telegram() {
        let config = ChannelConfig {
            transport: "telegram".into(),
            telegram: Some(TelegramChannelConfig {
                enabled: true,
                bot_token: "123:abc".into(),
            }),
            webhook: None,
        };
        let transport = build_transport(&config).unwrap();
        assert_eq!(transport.name(), "telegram");
    }

    #[test]
    fn test_build_webhook() {
        let config = ChannelConfig {
            transport: "webhook".into(),
            telegram: None,
            webhook: Some(WebhookChannelConfig {
                enabled: true,
                url: "https://hooks.example.com".into(),
                headers: vec![],
            }),
        };
        let transport = build_transport(&config).unwrap();
        assert_eq!(transport.name(), "webhook");
    }

    #[test]
    fn test_unconfigured_is_setup_error() {
        let config = ChannelConfig::default();
        let err = build_transport(&config).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unknown_transport_is_setup_error() {
        let config = ChannelConfig {
            transport: "pigeon".into(),
            telegram: None,
            webhook: None,
        };
        assert!(build_transport(&config).unwrap_err().is_fatal());
    }
}
