//! duet-core — identifiers, wire protocol, and configuration.
//! All other duet crates depend on this one.

pub mod config;
pub mod ids;
pub mod protocol;

pub use ids::{IdError, ParticipantId, SessionId};
pub use protocol::{now_millis, ChatText, ClientEvent, EndReason, Payload, ProtocolError, ServerEvent, Signal};
