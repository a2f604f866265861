//! Matching engine — turns waiting participants into sessions.
//!
//! Runs synchronously, under the broker lock, after every operation that
//! changes the waiting list. Candidates are taken in arrival order; the
//! first eligible pair wins. A candidate whose connection has already
//! closed is discarded here and never re-queued: its disconnect event will
//! remove the record.

use duet_core::{ParticipantId, ServerEvent};

use crate::participant::ParticipantState;
use crate::policy::{Candidate, PairingPolicy};
use crate::registry::Session;
use crate::state::BrokerState;

/// What one matching pass did to the waiting list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MatchPass {
    pub created: usize,
    pub discarded: usize,
}

impl MatchPass {
    /// True if any waiter left the list, so positions may have moved.
    pub fn changed_queue(&self) -> bool {
        self.created > 0 || self.discarded > 0
    }
}

impl<P> BrokerState<P> {
    fn candidate(&self, id: &ParticipantId) -> Candidate<'_> {
        Candidate {
            id: *id,
            name: self.participants.get(id).and_then(|p| p.name.as_deref()),
        }
    }

    fn is_live(&self, id: &ParticipantId) -> bool {
        self.participants
            .get(id)
            .map(|p| p.handle.is_open())
            .unwrap_or(false)
    }

    /// Earliest eligible pair in arrival order: lowest `i`, then lowest `j`.
    /// With `AllowAll` this is always the two oldest waiters.
    fn select_pair(&self, policy: &dyn PairingPolicy) -> Option<(ParticipantId, ParticipantId)> {
        let n = self.waiting.len();
        for i in 0..n {
            let a_id = self.waiting.get(i)?;
            let a = self.candidate(&a_id);
            for j in (i + 1)..n {
                let b_id = self.waiting.get(j)?;
                if policy.can_pair(&a, &self.candidate(&b_id)) {
                    return Some((a_id, b_id));
                }
            }
        }
        None
    }

    /// Drop a candidate that can no longer be paired.
    fn discard(&mut self, id: &ParticipantId) {
        self.waiting.remove(id);
        if let Some(p) = self.participants.get_mut(id) {
            p.state = ParticipantState::Idle;
        }
        tracing::debug!(
            broker = self.label,
            participant = %id.short(),
            "discarded closed candidate"
        );
    }

    /// Pair waiters until no eligible pair remains.
    pub(crate) fn run_matching(&mut self, policy: &dyn PairingPolicy) -> MatchPass {
        let mut pass = MatchPass::default();

        while self.waiting.len() >= 2 {
            let Some((a, b)) = self.select_pair(policy) else {
                break;
            };

            // Open-check immediately before commit: a connection that died
            // while queued must not end up in a session.
            let a_live = self.is_live(&a);
            let b_live = self.is_live(&b);
            if !a_live || !b_live {
                if !a_live {
                    self.discard(&a);
                    pass.discarded += 1;
                }
                if !b_live {
                    self.discard(&b);
                    pass.discarded += 1;
                }
                continue;
            }

            self.commit(a, b);
            pass.created += 1;
        }

        pass
    }

    fn commit(&mut self, a: ParticipantId, b: ParticipantId) {
        self.waiting.remove(&a);
        self.waiting.remove(&b);

        let session = Session::new(a, b);
        let session_id = session.id;
        self.pairs.insert(session);

        let mut names = [None, None];
        for (slot, id) in names.iter_mut().zip([a, b]) {
            if let Some(p) = self.participants.get_mut(&id) {
                p.state = ParticipantState::Paired(session_id);
                *slot = p.name.clone();
            }
        }
        let [name_a, name_b] = names;

        self.notify(
            &a,
            ServerEvent::Matched {
                session_id,
                partner_id: b,
                partner_name: name_b,
            },
        );
        self.notify(
            &b,
            ServerEvent::Matched {
                session_id,
                partner_id: a,
                partner_name: name_a,
            },
        );

        self.counters.sessions_created += 1;
        tracing::info!(
            broker = self.label,
            session = %session_id.short(),
            a = %a.short(),
            b = %b.short(),
            waiting = self.waiting.len(),
            "paired"
        );
    }
}
