//! HTTP handlers — WebSocket gateway plus the JSON admin surface.

pub mod blocks;
pub mod gateway;
pub mod sessions;
pub mod status;

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use tokio::sync::broadcast;

use duet_core::config::DuetConfig;
use duet_core::{ChatText, Payload, SessionId, Signal};
use duet_services::{
    AllowAll, BlockList, Broker, BrokerOptions, BrokerSnapshot, PairingPolicy, SessionInfo,
};

#[derive(Clone)]
pub struct ApiState {
    /// None when the chat broker is disabled in config.
    pub chat: Option<Broker<ChatText>>,
    pub call: Option<Broker<Signal>>,
    /// Shared with the brokers' pairing policy when `block_list_enabled`.
    pub blocks: BlockList,
    pub block_list_enabled: bool,
    /// Largest inbound WebSocket message accepted.
    pub max_frame_bytes: usize,
    pub started_at: Instant,
    /// Shutdown broadcast sender — signals graceful daemon shutdown.
    pub shutdown_tx: broadcast::Sender<()>,
}

fn build_broker<P: Payload>(
    enabled: bool,
    label: &'static str,
    policy: &Arc<dyn PairingPolicy>,
    options: BrokerOptions,
) -> Option<Broker<P>> {
    if !enabled {
        tracing::info!(broker = label, "broker disabled");
        return None;
    }
    Some(Broker::with_policy(label, policy.clone(), options))
}

impl ApiState {
    /// Build the brokers and shared block list described by `config`.
    pub fn from_config(config: &DuetConfig, shutdown_tx: broadcast::Sender<()>) -> Self {
        let blocks = BlockList::from_pairs(&config.matching.blocked_pairs);
        let policy: Arc<dyn PairingPolicy> = if config.matching.block_list {
            tracing::info!(pairs = blocks.len(), "block list enabled");
            Arc::new(blocks.clone())
        } else {
            Arc::new(AllowAll)
        };
        let options = BrokerOptions {
            queue_updates: config.matching.queue_updates,
        };

        Self {
            chat: build_broker(config.brokers.chat, "chat", &policy, options),
            call: build_broker(config.brokers.call, "call", &policy, options),
            blocks,
            block_list_enabled: config.matching.block_list,
            max_frame_bytes: config.network.max_frame_bytes,
            started_at: Instant::now(),
            shutdown_tx,
        }
    }

    /// Enabled brokers, in a fixed order.
    fn brokers(&self) -> Vec<BrokerRef<'_>> {
        let mut out = Vec::with_capacity(2);
        if let Some(b) = &self.chat {
            out.push(BrokerRef::Chat(b));
        }
        if let Some(b) = &self.call {
            out.push(BrokerRef::Call(b));
        }
        out
    }

    fn broker(&self, name: &str) -> Result<BrokerRef<'_>, (StatusCode, String)> {
        let found = match name {
            "chat" => self.chat.as_ref().map(BrokerRef::Chat),
            "call" => self.call.as_ref().map(BrokerRef::Call),
            _ => None,
        };
        found.ok_or((StatusCode::NOT_FOUND, format!("no broker named {name}")))
    }
}

/// A broker of either payload type, for handlers that only inspect.
enum BrokerRef<'a> {
    Chat(&'a Broker<ChatText>),
    Call(&'a Broker<Signal>),
}

impl BrokerRef<'_> {
    fn label(&self) -> &'static str {
        match self {
            BrokerRef::Chat(b) => b.label(),
            BrokerRef::Call(b) => b.label(),
        }
    }

    async fn snapshot(&self) -> BrokerSnapshot {
        match self {
            BrokerRef::Chat(b) => b.snapshot().await,
            BrokerRef::Call(b) => b.snapshot().await,
        }
    }

    async fn sessions(&self) -> Vec<SessionInfo> {
        match self {
            BrokerRef::Chat(b) => b.sessions().await,
            BrokerRef::Call(b) => b.sessions().await,
        }
    }

    async fn session(&self, id: &SessionId) -> Option<SessionInfo> {
        match self {
            BrokerRef::Chat(b) => b.session(id).await,
            BrokerRef::Call(b) => b.session(id).await,
        }
    }

    async fn rematch(&self) -> usize {
        match self {
            BrokerRef::Chat(b) => b.rematch().await,
            BrokerRef::Call(b) => b.rematch().await,
        }
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Parse a hex-encoded session ID.
fn parse_session_id(hex_str: &str) -> Result<SessionId, (StatusCode, String)> {
    SessionId::parse(hex_str).map_err(|e| (StatusCode::BAD_REQUEST, format!("session_id: {e}")))
}

// Re-export handler functions for use in router setup.
pub use blocks::{handle_block_add, handle_block_list, handle_block_remove};
pub use gateway::{handle_call_ws, handle_chat_ws};
pub use sessions::{handle_session_inspect, handle_sessions};
pub use status::{handle_shutdown, handle_status};
