//! /blocks handlers — operator-managed pairs of names that never match.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use duet_services::normalize_name;

use super::ApiState;

#[derive(Serialize, Deserialize)]
pub struct BlockedPair {
    pub a: String,
    pub b: String,
}

impl BlockedPair {
    /// Apply the same normalization participant names go through.
    fn normalized(&self) -> Result<(String, String), (StatusCode, String)> {
        let blank = || (StatusCode::BAD_REQUEST, "names must not be blank".to_string());
        let a = normalize_name(&self.a).ok_or_else(blank)?;
        let b = normalize_name(&self.b).ok_or_else(blank)?;
        if a == b {
            return Err((
                StatusCode::BAD_REQUEST,
                "a name cannot be blocked from itself".to_string(),
            ));
        }
        Ok((a, b))
    }
}

// ── /blocks (GET) ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct BlockListResponse {
    pub enabled: bool,
    pub pairs: Vec<BlockedPair>,
}

pub async fn handle_block_list(State(state): State<ApiState>) -> Json<BlockListResponse> {
    let pairs = state
        .blocks
        .list()
        .into_iter()
        .map(|(a, b)| BlockedPair { a, b })
        .collect();

    Json(BlockListResponse {
        enabled: state.block_list_enabled,
        pairs,
    })
}

// ── /blocks/add (POST) ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct BlockAddResponse {
    pub a: String,
    pub b: String,
    pub added: bool,
}

pub async fn handle_block_add(
    State(state): State<ApiState>,
    Json(req): Json<BlockedPair>,
) -> Result<Json<BlockAddResponse>, (StatusCode, String)> {
    let (a, b) = req.normalized()?;
    let added = state.blocks.block(&a, &b);

    Ok(Json(BlockAddResponse { a, b, added }))
}

// ── /blocks/remove (POST) ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct BlockRemoveResponse {
    pub a: String,
    pub b: String,
    pub removed: bool,
    /// Sessions formed by waiters the block had kept apart.
    pub matched: usize,
}

pub async fn handle_block_remove(
    State(state): State<ApiState>,
    Json(req): Json<BlockedPair>,
) -> Result<Json<BlockRemoveResponse>, (StatusCode, String)> {
    let (a, b) = req.normalized()?;
    let removed = state.blocks.unblock(&a, &b);

    let mut matched = 0;
    if removed && state.block_list_enabled {
        for broker in state.brokers() {
            matched += broker.rematch().await;
        }
        tracing::info!(a = %a, b = %b, matched, "pair unblocked");
    }

    Ok(Json(BlockRemoveResponse {
        a,
        b,
        removed,
        matched,
    }))
}
