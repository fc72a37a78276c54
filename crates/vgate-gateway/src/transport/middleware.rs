//! Gate middleware (Ignored / Intercepted / PassThrough).
//!
//! - Ignored: the request goes downstream untouched.
//! - Intercepted: the application is never called; the verdict answers.
//! - PassThrough: the application answers; verdict headers are merged in.
//!
//! Dropping the request future (client gone) drops the in-flight verdict
//! call with it.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::app_state::GateState;
use crate::enrich::substitute_response;
use crate::inspect::Inspection;
use crate::policy::Disposition;
use crate::transport::view::request_view;

pub async fn gate_middleware(State(gate): State<GateState>, req: Request, next: Next) -> Response {
    let view = request_view(&req);

    let (verdict, elapsed, disposition) = match gate.inspector().inspect(&view).await {
        Inspection::Ignored => return next.run(req).await,
        Inspection::Evaluated {
            verdict,
            elapsed,
            disposition,
        } => (verdict, elapsed, disposition),
    };

    match disposition {
        Disposition::Intercepted => {
            tracing::info!(
                method = %view.method,
                path = %view.path,
                outcome = verdict.outcome(),
                status = ?verdict.http_status,
                "request intercepted"
            );
            substitute_response(&verdict)
        }
        Disposition::PassThrough | Disposition::Ignored => {
            let mut resp = next.run(req).await;
            gate.enricher().enrich(resp.headers_mut(), &verdict, elapsed);
            resp
        }
    }
}
