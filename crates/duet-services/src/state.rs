//! Broker state — everything guarded by the broker's single lock.
//!
//! Participants, the waiting list and the pair registry change together,
//! so they live in one struct behind one mutex. Matching (`matching.rs`)
//! and forwarding (`relay.rs`) are further `impl` blocks on this type.

use std::collections::HashMap;

use serde::Serialize;

use duet_core::{EndReason, ParticipantId, ServerEvent, SessionId};

use crate::participant::{Participant, ParticipantState};
use crate::registry::PairRegistry;
use crate::waiting::WaitingList;

/// Running totals since the broker started.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BrokerCounters {
    pub sessions_created: u64,
    pub sessions_ended: u64,
    pub relayed: u64,
    /// Relay requests that named an unknown session or a session the
    /// sender is not part of.
    pub dropped: u64,
}

/// A broken structural invariant. None of these should ever be observed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("waiting participant {0} has no record")]
    UnknownWaiter(ParticipantId),
    #[error("participant {0} is waiting but not in Queued state")]
    WaitingNotQueued(ParticipantId),
    #[error("participant {0} is Queued but not in the waiting list")]
    QueuedNotWaiting(ParticipantId),
    #[error("participant {0} is both waiting and paired")]
    WaitingAndPaired(ParticipantId),
    #[error("session {0} references missing participant {1}")]
    MissingMember(SessionId, ParticipantId),
    #[error("participant {1} in session {0} has a different state")]
    MemberStateMismatch(SessionId, ParticipantId),
    #[error("participant {0} claims session {1} which is not registered")]
    DanglingPairing(ParticipantId, SessionId),
    #[error("member index for {0} disagrees with the session table")]
    IndexMismatch(ParticipantId),
}

pub(crate) struct BrokerState<P> {
    pub(crate) label: &'static str,
    pub(crate) queue_updates: bool,
    pub(crate) participants: HashMap<ParticipantId, Participant<P>>,
    pub(crate) waiting: WaitingList,
    pub(crate) pairs: PairRegistry,
    pub(crate) counters: BrokerCounters,
}

impl<P> BrokerState<P> {
    pub(crate) fn new(label: &'static str, queue_updates: bool) -> Self {
        Self {
            label,
            queue_updates,
            participants: HashMap::new(),
            waiting: WaitingList::new(),
            pairs: PairRegistry::new(),
            counters: BrokerCounters::default(),
        }
    }

    /// Send to a participant if it is still registered.
    pub(crate) fn notify(&self, id: &ParticipantId, event: ServerEvent<P>) -> bool {
        self.participants
            .get(id)
            .map(|p| p.handle.send(event))
            .unwrap_or(false)
    }

    /// Remove a session and tell the member that did not cause it.
    ///
    /// The registry removal is the single point that decides which caller
    /// performs the teardown; a second caller finds nothing and returns false.
    pub(crate) fn teardown(
        &mut self,
        session_id: &SessionId,
        initiator: &ParticipantId,
        reason: EndReason,
    ) -> bool {
        let Some(session) = self.pairs.remove(session_id) else {
            return false;
        };

        for member in &session.members {
            if let Some(p) = self.participants.get_mut(member) {
                p.state = ParticipantState::Idle;
            }
        }

        if let Some(survivor) = session.partner_of(initiator) {
            self.notify(
                &survivor,
                ServerEvent::SessionEnded {
                    session_id: *session_id,
                    reason,
                },
            );
        }

        self.counters.sessions_ended += 1;
        tracing::info!(
            broker = self.label,
            session = %session_id.short(),
            initiator = %initiator.short(),
            ?reason,
            secs = session.established_at.elapsed().as_secs(),
            "session ended"
        );
        true
    }

    /// Push current position to every waiter except `skip`.
    pub(crate) fn broadcast_queue(&self, skip: Option<&ParticipantId>) {
        if !self.queue_updates {
            return;
        }
        let queue_size = self.waiting.len();
        for (index, id) in self.waiting.iter().enumerate() {
            if Some(id) == skip {
                continue;
            }
            self.notify(
                id,
                ServerEvent::QueueUpdate {
                    position: index + 1,
                    queue_size,
                },
            );
        }
    }

    pub(crate) fn enqueued_event(&self, id: &ParticipantId) -> Option<ServerEvent<P>> {
        self.waiting
            .position(id)
            .map(|position| ServerEvent::Enqueued {
                position,
                queue_size: self.waiting.len(),
            })
    }

    /// Cross-check participants, waiting list and registry.
    pub(crate) fn audit(&self) -> Result<(), InvariantViolation> {
        for id in self.waiting.iter() {
            let p = self
                .participants
                .get(id)
                .ok_or(InvariantViolation::UnknownWaiter(*id))?;
            if p.state != ParticipantState::Queued {
                return Err(InvariantViolation::WaitingNotQueued(*id));
            }
            if self.pairs.session_of(id).is_some() {
                return Err(InvariantViolation::WaitingAndPaired(*id));
            }
        }

        for session in self.pairs.iter() {
            for member in &session.members {
                let p = self
                    .participants
                    .get(member)
                    .ok_or(InvariantViolation::MissingMember(session.id, *member))?;
                if p.state != ParticipantState::Paired(session.id) {
                    return Err(InvariantViolation::MemberStateMismatch(session.id, *member));
                }
            }
        }

        for (member, session_id) in self.pairs.member_index() {
            let consistent = self
                .pairs
                .get(session_id)
                .map(|s| s.contains(member))
                .unwrap_or(false);
            if !consistent {
                return Err(InvariantViolation::IndexMismatch(*member));
            }
        }

        for p in self.participants.values() {
            match p.state {
                ParticipantState::Queued if !self.waiting.contains(&p.id) => {
                    return Err(InvariantViolation::QueuedNotWaiting(p.id));
                }
                ParticipantState::Paired(sid) if self.pairs.get(&sid).is_none() => {
                    return Err(InvariantViolation::DanglingPairing(p.id, sid));
                }
                _ => {}
            }
        }

        Ok(())
    }
}
