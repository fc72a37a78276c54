//! Axum router wiring.
//!
//! `protect` wraps any application router with the gate; `build_router`
//! additionally mounts an ungated `/metrics` endpoint.

use axum::{extract::State, middleware, routing::get, Router};

use crate::{app_state::GateState, transport};

pub fn protect(app: Router, state: GateState) -> Router {
    app.layer(middleware::from_fn_with_state(state, transport::gate_middleware))
}

pub fn build_router(state: GateState, app: Router) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .with_state(state.clone())
        .merge(protect(app, state))
}

async fn metrics(State(state): State<GateState>) -> String {
    state.metrics().render()
}
