//! duetd — anonymous pairing broker daemon.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use duet_api::ApiState;
use duet_core::config::DuetConfig;

mod snapshot;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = DuetConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = DuetConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        DuetConfig::default()
    });
    tracing::info!(path = %DuetConfig::file_path().display(), "duetd starting");

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // Brokers
    let state = ApiState::from_config(&config, shutdown_tx.clone());
    if state.chat.is_none() && state.call.is_none() {
        tracing::warn!("no brokers enabled — gateway will refuse every connection");
    }

    // ── Listeners ────────────────────────────────────────────────────────────

    let ws_addr = format!("{}:{}", config.network.bind_addr, config.network.ws_port);
    let ws_listener = TcpListener::bind(&ws_addr)
        .await
        .with_context(|| format!("failed to bind gateway on {ws_addr}"))?;

    let api_addr = format!("127.0.0.1:{}", config.network.api_port);
    let api_listener = TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API on {api_addr}"))?;

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let gateway_task = tokio::spawn(duet_api::serve(
        ws_listener,
        duet_api::gateway_router(state.clone()),
        shutdown_tx.subscribe(),
    ));

    let snapshot_task = match config.brokers.snapshot_interval_secs {
        0 => None,
        secs => Some(tokio::spawn(snapshot::snapshot_loop(
            state.chat.clone(),
            state.call.clone(),
            Duration::from_secs(secs),
        ))),
    };

    let api_task = tokio::spawn(duet_api::serve(
        api_listener,
        duet_api::api_router(state),
        shutdown_tx.subscribe(),
    ));

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = gateway_task       => tracing::error!("gateway exited: {:?}", r),
        r = api_task           => tracing::error!("API server exited: {:?}", r),
    }

    if let Some(task) = snapshot_task {
        task.abort();
    }

    Ok(())
}
