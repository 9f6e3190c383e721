//! Server bootstrap with graceful shutdown.

use anyhow::Context;
use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

pub async fn serve(state: Arc<AppState>, router: Router) -> Result<(), anyhow::Error> {
    let addr = format!("0.0.0.0:{}", state.config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, environment = %state.config.environment, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
