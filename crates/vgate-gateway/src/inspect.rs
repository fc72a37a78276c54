//! Per-request inspection: ignore check, verdict acquisition, decision.
//!
//! The inspector is the host-independent half of the middleware; the axum
//! adapter in `transport` only converts requests and acts on the result.

use std::sync::Arc;
use std::time::{Duration, Instant};

use vgate_core::attributes::extract;
use vgate_core::{RequestView, Verdict};

use crate::client::VerdictClient;
use crate::obs::GateMetrics;
use crate::policy::{Disposition, PolicyGate};

/// Result of inspecting one request.
#[derive(Debug, Clone)]
pub enum Inspection {
    /// Skipped by routing rules; no remote call was made.
    Ignored,
    Evaluated {
        verdict: Verdict,
        /// Wall-clock time spent obtaining the verdict.
        elapsed: Duration,
        disposition: Disposition,
    },
}

impl Inspection {
    pub fn disposition(&self) -> Disposition {
        match self {
            Inspection::Ignored => Disposition::Ignored,
            Inspection::Evaluated { disposition, .. } => *disposition,
        }
    }
}

pub struct Inspector {
    policy: PolicyGate,
    client: Arc<dyn VerdictClient>,
    metrics: Arc<GateMetrics>,
}

impl Inspector {
    pub fn new(policy: PolicyGate, client: Arc<dyn VerdictClient>, metrics: Arc<GateMetrics>) -> Self {
        Self {
            policy,
            client,
            metrics,
        }
    }

    pub async fn inspect(&self, req: &RequestView) -> Inspection {
        if self.policy.should_ignore(req) {
            tracing::debug!(host = ?req.host, path = %req.path, "request ignored by routing rules");
            self.metrics
                .dispositions
                .inc(&[("disposition", Disposition::Ignored.as_str())]);
            return Inspection::Ignored;
        }

        let attributes = extract(req);
        tracing::debug!(?attributes, "validation request");

        let started = Instant::now();
        let verdict = {
            // Released on cancellation too.
            let _inflight = self.metrics.verdicts_inflight.track();
            self.client.evaluate(&attributes).await
        };
        let elapsed = started.elapsed();

        tracing::debug!(?verdict, ?elapsed, "validation response");

        let disposition = self.policy.decide(req, &verdict);
        if verdict.is_flagged() && disposition == Disposition::PassThrough {
            tracing::info!(
                path = %req.path,
                outcome = verdict.outcome(),
                "monitor mode: flagged request let through"
            );
        }

        let outcome = verdict.outcome();
        self.metrics.verdicts.inc(&[("outcome", outcome)]);
        self.metrics
            .verdict_duration
            .observe(&[("outcome", outcome)], elapsed);
        self.metrics
            .dispositions
            .inc(&[("disposition", disposition.as_str())]);

        Inspection::Evaluated {
            verdict,
            elapsed,
            disposition,
        }
    }
}
