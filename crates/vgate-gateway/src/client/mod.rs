//! Verdict service client.
//!
//! `VerdictClient` is the seam between the gate and the remote service.
//! Implementations never fail: transport problems resolve to a pass verdict
//! (fail-open) so an unreachable service never blocks traffic.

pub mod http;

use async_trait::async_trait;

use vgate_core::{RequestAttributes, Verdict};

pub use http::{HttpVerdictClient, ModuleInfo};

#[async_trait]
pub trait VerdictClient: Send + Sync {
    async fn evaluate(&self, attributes: &RequestAttributes) -> Verdict;
}
