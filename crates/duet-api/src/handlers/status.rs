//! /status and /daemon/shutdown handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use duet_services::BrokerSnapshot;

use super::ApiState;

// ── /status ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusResponse {
    pub uptime_secs: u64,
    pub brokers: Vec<BrokerSnapshot>,
    pub block_list_enabled: bool,
    pub blocked_pairs: usize,
}

pub async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let mut brokers = Vec::new();
    for broker in state.brokers() {
        brokers.push(broker.snapshot().await);
    }

    Json(StatusResponse {
        uptime_secs: state.started_at.elapsed().as_secs(),
        brokers,
        block_list_enabled: state.block_list_enabled,
        blocked_pairs: state.blocks.len(),
    })
}

// ── /daemon/shutdown ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ShutdownResponse {
    pub message: String,
}

pub async fn handle_shutdown(State(state): State<ApiState>) -> Json<ShutdownResponse> {
    tracing::info!("shutdown requested via API");
    // No receivers means nothing is left to stop.
    let _ = state.shutdown_tx.send(());

    Json(ShutdownResponse {
        message: "Shutdown initiated".to_string(),
    })
}
