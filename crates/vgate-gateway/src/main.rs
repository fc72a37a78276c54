//! vgate demo host.
//!
//! Serves a small application behind the gate:
//! - config from `vgate.yaml` (or the path in `VGATE_CONFIG`)
//! - `/metrics` exposed outside the gate
//! - graceful shutdown on Ctrl+C / SIGTERM

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tracing_subscriber::{fmt, EnvFilter};

use vgate_gateway::{app_state::GateState, config, router};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run().await {
        tracing::error!(code = e.client_code().as_str(), error = %e, "vgate-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> vgate_core::Result<()> {
    let path = std::env::var("VGATE_CONFIG").unwrap_or_else(|_| "vgate.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| vgate_core::VGateError::BadConfig(format!("server.listen: {e}")))?;

    let state = GateState::new(cfg)?;

    let app = Router::new()
        .route("/", get(|| async { "hello from behind the gate\n" }))
        .route("/login", get(|| async { "login page\n" }).post(|| async { "logged in\n" }));
    let app = router::build_router(state, app);

    tracing::info!(%listen, "vgate-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| vgate_core::VGateError::Internal(format!("bind {listen}: {e}")))?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| vgate_core::VGateError::Internal(format!("server failed: {e}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
