//! # BizPulse Source
//! REST client for the business backend. The backend decides what counts as
//! "new since last check" and advances its own checkpoint — every call here
//! is an idempotent read.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use bizpulse_core::config::SourceConfig;
use bizpulse_core::error::{BizPulseError, Result};
use bizpulse_core::traits::EventSource;
use bizpulse_core::types::{Advertisement, Event};

/// Backend response envelope: `{ ok, data, message }`.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    message: Option<String>,
}

/// HTTP-backed event source.
pub struct HttpEventSource {
    config: SourceConfig,
    client: reqwest::Client,
}

impl HttpEventSource {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let mut req = self
            .client
            .get(self.url(path))
            .timeout(self.config.timeout());
        if !self.config.api_token.is_empty() {
            req = req.bearer_auth(&self.config.api_token);
        }

        let response = req
            .send()
            .await
            .map_err(|e| BizPulseError::Source(format!("GET {path} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(BizPulseError::Source(format!(
                "GET {path}: HTTP {}",
                response.status()
            )));
        }

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| BizPulseError::Source(format!("GET {path}: invalid response: {e}")))?;

        if !body.ok {
            return Err(BizPulseError::Source(format!(
                "GET {path}: {}",
                body.message.unwrap_or_else(|| "backend error".into())
            )));
        }
        body.data
            .ok_or_else(|| BizPulseError::Source(format!("GET {path}: empty data")))
    }

    /// Bare probe — no envelope, 2xx is healthy.
    async fn probe(&self, path: &str) -> Result<()> {
        let response = self
            .client
            .get(self.url(path))
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(|e| BizPulseError::Source(format!("GET {path} failed: {e}")))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(BizPulseError::Source(format!(
                "GET {path}: HTTP {}",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn poll_new_events(&self) -> Result<Vec<Event>> {
        let events: Vec<Event> = self.get("/api/monitor/events").await?;
        tracing::debug!("Polled {} new event(s)", events.len());
        Ok(events)
    }

    async fn list_broadcast_ads(&self) -> Result<Vec<Advertisement>> {
        self.get("/api/ads/broadcast").await
    }

    async fn list_all_members(&self) -> Result<Vec<String>> {
        self.get("/api/members/ids").await
    }

    async fn ping_store(&self) -> Result<()> {
        self.probe("/health/db").await
    }

    async fn ping_cache(&self) -> Result<()> {
        self.probe("/health/cache").await.map_err(|e| match e {
            BizPulseError::Source(msg) => BizPulseError::Cache(msg),
            other => other,
        })
    }
}
