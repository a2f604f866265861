//! Broker — the lifecycle controller every connection talks to.
//!
//! One `Broker<P>` per payload type. All operations take the same async
//! mutex around [`BrokerState`], so matching, forwarding and teardown never
//! interleave. Matching runs eagerly inside whichever operation changed the
//! waiting list; there is no background matcher.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use duet_core::{ClientEvent, EndReason, ParticipantId, Payload, ServerEvent, SessionId};

use crate::handle::ConnectionHandle;
use crate::participant::{normalize_name, Participant, ParticipantState};
use crate::policy::{AllowAll, PairingPolicy};
use crate::registry::Session;
use crate::state::{BrokerCounters, BrokerState, InvariantViolation};

#[derive(Debug, Clone, Copy)]
pub struct BrokerOptions {
    /// Push `queue-update` to waiters whenever the waiting list changes.
    pub queue_updates: bool,
}

impl Default for BrokerOptions {
    fn default() -> Self {
        Self {
            queue_updates: true,
        }
    }
}

/// Point-in-time counts for status output.
#[derive(Debug, Clone, Serialize)]
pub struct BrokerSnapshot {
    pub broker: &'static str,
    pub connected: usize,
    pub idle: usize,
    pub queued: usize,
    pub paired: usize,
    pub active_sessions: usize,
    #[serde(flatten)]
    pub counters: BrokerCounters,
    /// False if `audit()` found a broken invariant.
    pub consistent: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub members: [ParticipantId; 2],
    pub member_names: [Option<String>; 2],
    pub established_secs: u64,
}

pub struct Broker<P> {
    label: &'static str,
    state: Arc<Mutex<BrokerState<P>>>,
    policy: Arc<dyn PairingPolicy>,
}

impl<P> Clone for Broker<P> {
    fn clone(&self) -> Self {
        Self {
            label: self.label,
            state: self.state.clone(),
            policy: self.policy.clone(),
        }
    }
}

impl<P: Payload> Broker<P> {
    /// Strict arrival-order matching with default options.
    pub fn new(label: &'static str) -> Self {
        Self::with_policy(label, Arc::new(AllowAll), BrokerOptions::default())
    }

    pub fn with_policy(
        label: &'static str,
        policy: Arc<dyn PairingPolicy>,
        options: BrokerOptions,
    ) -> Self {
        Self {
            label,
            state: Arc::new(Mutex::new(BrokerState::new(label, options.queue_updates))),
            policy,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Register a new connection and greet it with its identifier.
    pub async fn connect(&self, handle: ConnectionHandle<P>) -> ParticipantId {
        let id = ParticipantId::generate();
        let mut state = self.state.lock().await;
        state.participants.insert(id, Participant::new(id, handle));
        state.notify(&id, ServerEvent::Hello { participant_id: id });
        tracing::info!(
            broker = self.label,
            participant = %id.short(),
            connected = state.participants.len(),
            "participant connected"
        );
        id
    }

    pub async fn set_name(&self, id: ParticipantId, raw: &str) {
        let mut state = self.state.lock().await;
        let Some(p) = state.participants.get_mut(&id) else {
            return;
        };
        p.name = normalize_name(raw);
        tracing::debug!(broker = self.label, participant = %id.short(), name = ?p.name, "name set");

        // A new name can lift a block-list refusal.
        if p.state == ParticipantState::Queued {
            if state.run_matching(self.policy.as_ref()).changed_queue() {
                state.broadcast_queue(None);
            }
        }
    }

    /// Enter the waiting list. Ignored while paired; repeats the current
    /// position while already queued.
    pub async fn join_queue(&self, id: ParticipantId) {
        let mut state = self.state.lock().await;
        let current = match state.participants.get(&id) {
            Some(p) => p.state,
            None => return,
        };

        match current {
            ParticipantState::Paired(session) => {
                tracing::debug!(
                    broker = self.label,
                    participant = %id.short(),
                    session = %session.short(),
                    "join while paired ignored"
                );
                return;
            }
            ParticipantState::Queued => {
                if let Some(ack) = state.enqueued_event(&id) {
                    state.notify(&id, ack);
                }
                return;
            }
            ParticipantState::Idle => {}
        }

        state.waiting.offer(id);
        if let Some(p) = state.participants.get_mut(&id) {
            p.state = ParticipantState::Queued;
        }
        if let Some(ack) = state.enqueued_event(&id) {
            state.notify(&id, ack);
        }
        tracing::debug!(
            broker = self.label,
            participant = %id.short(),
            waiting = state.waiting.len(),
            "joined queue"
        );

        let pass = state.run_matching(self.policy.as_ref());
        // The joiner already has its position unless matching moved it.
        let skip = if pass.changed_queue() { None } else { Some(&id) };
        state.broadcast_queue(skip);
    }

    pub async fn leave_queue(&self, id: ParticipantId) {
        let mut state = self.state.lock().await;
        let removed = state.waiting.remove(&id);
        if removed {
            if let Some(p) = state.participants.get_mut(&id) {
                p.state = ParticipantState::Idle;
            }
            state.notify(&id, ServerEvent::Dequeued);
            tracing::debug!(broker = self.label, participant = %id.short(), "left queue");
        }

        let pass = state.run_matching(self.policy.as_ref());
        if removed || pass.changed_queue() {
            state.broadcast_queue(None);
        }
    }

    /// End a session the caller belongs to. Returns false if the session is
    /// gone or the caller is not a member.
    pub async fn end_session(&self, id: ParticipantId, session_id: SessionId) -> bool {
        let mut state = self.state.lock().await;
        let member = state
            .pairs
            .get(&session_id)
            .map(|s| s.contains(&id))
            .unwrap_or(false);
        if !member {
            tracing::debug!(
                broker = self.label,
                participant = %id.short(),
                session = %session_id.short(),
                "end for unknown session ignored"
            );
            return false;
        }
        state.teardown(&session_id, &id, EndReason::Manual)
    }

    pub async fn relay(&self, session_id: SessionId, from: ParticipantId, payload: P) -> bool {
        self.state.lock().await.forward(&session_id, &from, payload)
    }

    /// Remove every trace of a participant. Safe to call more than once.
    pub async fn disconnect(&self, id: ParticipantId) {
        let mut state = self.state.lock().await;
        let Some(participant) = state.participants.remove(&id) else {
            return;
        };
        participant.handle.close();

        let was_waiting = state.waiting.remove(&id);
        if let Some(session_id) = state.pairs.session_of(&id).map(|s| s.id) {
            state.teardown(&session_id, &id, EndReason::PeerLeft);
        }

        let pass = state.run_matching(self.policy.as_ref());
        if was_waiting || pass.changed_queue() {
            state.broadcast_queue(None);
        }

        tracing::info!(
            broker = self.label,
            participant = %id.short(),
            secs = participant.connected_at.elapsed().as_secs(),
            connected = state.participants.len(),
            "participant disconnected"
        );
    }

    /// Dispatch one decoded inbound event.
    pub async fn handle_event(&self, id: ParticipantId, event: ClientEvent<P>) {
        match event {
            ClientEvent::SetName { name } => self.set_name(id, &name).await,
            ClientEvent::JoinQueue => self.join_queue(id).await,
            ClientEvent::LeaveQueue => self.leave_queue(id).await,
            ClientEvent::Relay {
                session_id,
                payload,
            } => {
                self.relay(session_id, id, payload).await;
            }
            ClientEvent::EndSession { session_id } => {
                self.end_session(id, session_id).await;
            }
        }
    }

    /// Run a matching pass outside of any participant event, for when the
    /// pairing policy has changed underneath the waiting list.
    pub async fn rematch(&self) -> usize {
        let mut state = self.state.lock().await;
        let pass = state.run_matching(self.policy.as_ref());
        if pass.changed_queue() {
            state.broadcast_queue(None);
        }
        pass.created
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    pub async fn snapshot(&self) -> BrokerSnapshot {
        let state = self.state.lock().await;
        let (mut idle, mut queued, mut paired) = (0, 0, 0);
        for p in state.participants.values() {
            match p.state {
                ParticipantState::Idle => idle += 1,
                ParticipantState::Queued => queued += 1,
                ParticipantState::Paired(_) => paired += 1,
            }
        }
        BrokerSnapshot {
            broker: self.label,
            connected: state.participants.len(),
            idle,
            queued,
            paired,
            active_sessions: state.pairs.len(),
            counters: state.counters,
            consistent: state.audit().is_ok(),
        }
    }

    /// Active sessions, oldest first.
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        let state = self.state.lock().await;
        let mut sessions: Vec<_> = state.pairs.iter().collect();
        sessions.sort_by_key(|s| s.established_at);
        sessions
            .into_iter()
            .map(|s| session_info(&state, s))
            .collect()
    }

    pub async fn session(&self, session_id: &SessionId) -> Option<SessionInfo> {
        let state = self.state.lock().await;
        state.pairs.get(session_id).map(|s| session_info(&state, s))
    }

    pub async fn queue_len(&self) -> usize {
        self.state.lock().await.waiting.len()
    }

    pub async fn audit(&self) -> Result<(), InvariantViolation> {
        self.state.lock().await.audit()
    }
}

fn session_info<P>(state: &BrokerState<P>, session: &Session) -> SessionInfo {
    let name_of = |id: &ParticipantId| state.participants.get(id).and_then(|p| p.name.clone());
    SessionInfo {
        session_id: session.id,
        members: session.members,
        member_names: [name_of(&session.members[0]), name_of(&session.members[1])],
        established_secs: session.established_at.elapsed().as_secs(),
    }
}
