//! Pair registry — active sessions, indexed by session and by member.

use std::collections::HashMap;
use std::time::Instant;

use duet_core::{ParticipantId, SessionId};

/// An active two-party session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub members: [ParticipantId; 2],
    pub established_at: Instant,
}

impl Session {
    pub fn new(a: ParticipantId, b: ParticipantId) -> Self {
        Self {
            id: SessionId::generate(),
            members: [a, b],
            established_at: Instant::now(),
        }
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.members.contains(id)
    }

    /// The other member, or None if `id` is not in this session.
    pub fn partner_of(&self, id: &ParticipantId) -> Option<ParticipantId> {
        match self.members {
            [a, b] if a == *id => Some(b),
            [a, b] if b == *id => Some(a),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct PairRegistry {
    sessions: HashMap<SessionId, Session>,
    by_member: HashMap<ParticipantId, SessionId>,
}

impl PairRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, session: Session) {
        for member in session.members {
            self.by_member.insert(member, session.id);
        }
        self.sessions.insert(session.id, session);
    }

    /// Remove a session and its member index entries.
    pub fn remove(&mut self, id: &SessionId) -> Option<Session> {
        let session = self.sessions.remove(id)?;
        for member in &session.members {
            if self.by_member.get(member) == Some(id) {
                self.by_member.remove(member);
            }
        }
        Some(session)
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// The session a participant belongs to, if any.
    pub fn session_of(&self, member: &ParticipantId) -> Option<&Session> {
        self.by_member
            .get(member)
            .and_then(|id| self.sessions.get(id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Member index entries, for consistency audits.
    pub(crate) fn member_index(&self) -> impl Iterator<Item = (&ParticipantId, &SessionId)> {
        self.by_member.iter()
    }
}
