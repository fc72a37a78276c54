//! Shared gate state.
//!
//! Built once at boot from an immutable `GateConfig`; cloned into every
//! request through axum state.

use std::sync::Arc;

use vgate_core::error::Result;

use crate::client::{HttpVerdictClient, VerdictClient};
use crate::config::GateConfig;
use crate::enrich::ResponseEnricher;
use crate::inspect::Inspector;
use crate::obs::GateMetrics;
use crate::policy::PolicyGate;

#[derive(Clone)]
pub struct GateState {
    inner: Arc<GateStateInner>,
}

struct GateStateInner {
    inspector: Inspector,
    enricher: ResponseEnricher,
    metrics: Arc<GateMetrics>,
}

impl GateState {
    /// Config-driven state with the HTTP verdict client.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GateConfig) -> Result<Self> {
        let client = Arc::new(HttpVerdictClient::new(&cfg.api)?);
        tracing::info!(endpoint = %client.endpoint(), "verdict client ready");

        let policy = PolicyGate::from_config(&cfg.gate)?;
        Ok(Self::with_parts(&cfg, policy, client))
    }

    /// Assemble from explicit parts (caller matchers, custom client).
    pub fn with_parts(cfg: &GateConfig, policy: PolicyGate, client: Arc<dyn VerdictClient>) -> Self {
        let metrics = Arc::new(GateMetrics::default());
        let enricher = ResponseEnricher::new(cfg.gate.expose_headers);

        tracing::info!(
            monitor_mode = policy.is_monitor_mode(),
            expose_headers = enricher.exposes_headers(),
            "gate configured"
        );

        let inspector = Inspector::new(policy, client, Arc::clone(&metrics));
        Self {
            inner: Arc::new(GateStateInner {
                inspector,
                enricher,
                metrics,
            }),
        }
    }

    pub fn inspector(&self) -> &Inspector {
        &self.inner.inspector
    }

    pub fn enricher(&self) -> &ResponseEnricher {
        &self.inner.enricher
    }

    pub fn metrics(&self) -> Arc<GateMetrics> {
        Arc::clone(&self.inner.metrics)
    }
}
