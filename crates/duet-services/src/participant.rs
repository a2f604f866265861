//! Participant records held by a broker.

use std::time::Instant;

use duet_core::{ParticipantId, SessionId};

use crate::handle::ConnectionHandle;

/// Longest display name kept, in characters.
pub const MAX_NAME_CHARS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantState {
    Idle,
    Queued,
    Paired(SessionId),
}

pub struct Participant<P> {
    pub id: ParticipantId,
    pub handle: ConnectionHandle<P>,
    pub state: ParticipantState,
    pub name: Option<String>,
    pub connected_at: Instant,
}

impl<P> Participant<P> {
    pub fn new(id: ParticipantId, handle: ConnectionHandle<P>) -> Self {
        Self {
            id,
            handle,
            state: ParticipantState::Idle,
            name: None,
            connected_at: Instant::now(),
        }
    }
}

/// Trim and cap a client-supplied name. Blank names and the placeholder
/// "unknown" carry no information and are dropped.
pub fn normalize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unknown") {
        return None;
    }
    Some(trimmed.chars().take(MAX_NAME_CHARS).collect())
}
