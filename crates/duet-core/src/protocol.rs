//! Wire protocol between participants and a broker.
//!
//! Every frame is one JSON object, internally tagged by `type`:
//!
//! ```text
//! {"type":"join-queue"}
//! {"type":"relay","session_id":"<hex>","payload":{"text":"hi"}}
//! {"type":"matched","session_id":"<hex>","partner_id":"<hex>","partner_name":null}
//! ```
//!
//! The relay payload is generic so the same broker serves text chat and
//! call signaling. Brokers never look inside it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::ids::{ParticipantId, SessionId};

/// Bound shared by every relay payload type.
pub trait Payload: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

// ── Inbound ───────────────────────────────────────────────────────────────────

/// Events a participant may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent<P> {
    /// Optional display label shown to future partners.
    SetName { name: String },
    JoinQueue,
    LeaveQueue,
    /// Opaque payload for the partner in `session_id`.
    Relay { session_id: SessionId, payload: P },
    EndSession { session_id: SessionId },
}

// ── Outbound ──────────────────────────────────────────────────────────────────

/// Why a session ended, as reported to the surviving member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndReason {
    /// The partner sent `end-session`.
    Manual,
    /// The partner's connection went away.
    PeerLeft,
}

/// Events a broker pushes to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent<P> {
    Hello {
        participant_id: ParticipantId,
    },
    /// Acknowledges `join-queue`. `position` is 1-based.
    Enqueued {
        position: usize,
        queue_size: usize,
    },
    QueueUpdate {
        position: usize,
        queue_size: usize,
    },
    Dequeued,
    Matched {
        session_id: SessionId,
        partner_id: ParticipantId,
        partner_name: Option<String>,
    },
    Relay {
        session_id: SessionId,
        from: ParticipantId,
        /// Unix milliseconds when the broker forwarded the payload.
        sent_at: u64,
        payload: P,
    },
    SessionEnded {
        session_id: SessionId,
        reason: EndReason,
    },
}

// ── Payloads ──────────────────────────────────────────────────────────────────

/// One line of text chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatText {
    pub text: String,
}

/// Call-signaling envelope (SDP offer/answer, ICE candidate, hang-up hints).
/// `data` is carried verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ── Codec ─────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed event: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Decode one inbound text frame.
pub fn decode<P: DeserializeOwned>(text: &str) -> Result<ClientEvent<P>, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Malformed)
}

/// Encode one outbound event as a text frame.
pub fn encode<P: Serialize>(event: &ServerEvent<P>) -> Result<String, ProtocolError> {
    serde_json::to_string(event).map_err(ProtocolError::Encode)
}
