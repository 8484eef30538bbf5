//! Preflight battery — four independent probes run before the loop starts.
//! A probe's own failure becomes `false` for its field, never an error from
//! `check()` itself. Pure query, safe to repeat.

use std::sync::Arc;

use bizpulse_core::traits::{EventSource, Transport};
use bizpulse_core::types::HealthStatus;

pub struct Preflight {
    feature_enabled: bool,
    transport: Arc<dyn Transport>,
    source: Arc<dyn EventSource>,
}

impl Preflight {
    pub fn new(
        feature_enabled: bool,
        transport: Arc<dyn Transport>,
        source: Arc<dyn EventSource>,
    ) -> Self {
        Self {
            feature_enabled,
            transport,
            source,
        }
    }

    /// Run all four probes and report. Computed fresh every call.
    pub async fn check(&self) -> HealthStatus {
        let transport_ok = match self.transport.healthcheck().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("⚠️ Transport probe failed: {e}");
                false
            }
        };
        let data_store_ok = match self.source.ping_store().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("⚠️ Data store probe failed: {e}");
                false
            }
        };
        let cache_ok = match self.source.ping_cache().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("⚠️ Cache probe failed: {e}");
                false
            }
        };

        HealthStatus {
            feature_enabled: self.feature_enabled,
            transport_ok,
            data_store_ok,
            cache_ok,
        }
    }
}
