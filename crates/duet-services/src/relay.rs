//! Relay router — forwards opaque payloads between session members.
//!
//! The payload is never inspected. A relay naming an unknown session, or a
//! session the sender does not belong to, is dropped without a reply.

use duet_core::{now_millis, EndReason, ParticipantId, ServerEvent, SessionId};

use crate::state::BrokerState;

impl<P> BrokerState<P> {
    /// Deliver `payload` to the other member of `session_id`.
    ///
    /// Returns whether the payload was handed to the partner's handle.
    pub(crate) fn forward(&mut self, session_id: &SessionId, from: &ParticipantId, payload: P) -> bool {
        let Some(partner) = self.pairs.get(session_id).and_then(|s| s.partner_of(from)) else {
            self.counters.dropped += 1;
            tracing::debug!(
                broker = self.label,
                session = %session_id.short(),
                participant = %from.short(),
                "relay for unknown session or non-member dropped"
            );
            return false;
        };

        if !self.participants.contains_key(&partner) {
            // Partner record is gone but the session survived: end it and
            // tell the sender, who is the only one left to hear about it.
            tracing::warn!(
                broker = self.label,
                session = %session_id.short(),
                partner = %partner.short(),
                "stale session member, tearing down"
            );
            self.counters.dropped += 1;
            self.teardown(session_id, &partner, EndReason::PeerLeft);
            return false;
        }

        let delivered = self.notify(
            &partner,
            ServerEvent::Relay {
                session_id: *session_id,
                from: *from,
                sent_at: now_millis(),
                payload,
            },
        );
        if delivered {
            self.counters.relayed += 1;
        } else {
            self.counters.dropped += 1;
        }
        delivered
    }
}
