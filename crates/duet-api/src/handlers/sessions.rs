//! /brokers/{broker}/sessions handlers — active session inspection.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use duet_services::SessionInfo;

use super::{parse_session_id, ApiState};

// ── /brokers/{broker}/sessions ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SessionsResponse {
    pub broker: String,
    pub sessions: Vec<SessionInfo>,
}

pub async fn handle_sessions(
    State(state): State<ApiState>,
    Path(broker): Path<String>,
) -> Result<Json<SessionsResponse>, (StatusCode, String)> {
    let target = state.broker(&broker)?;
    let sessions = target.sessions().await;

    Ok(Json(SessionsResponse {
        broker: target.label().to_string(),
        sessions,
    }))
}

// ── /brokers/{broker}/sessions/{id} ───────────────────────────────────────────

pub async fn handle_session_inspect(
    State(state): State<ApiState>,
    Path((broker, session_id)): Path<(String, String)>,
) -> Result<Json<SessionInfo>, (StatusCode, String)> {
    let target = state.broker(&broker)?;
    let id = parse_session_id(&session_id)?;

    target
        .session(&id)
        .await
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "session not found".to_string()))
}
