//! Waiting list — FIFO of participants looking for a partner.

use std::collections::{HashSet, VecDeque};

use duet_core::ParticipantId;

/// Arrival-ordered queue with set semantics: an id is present at most once.
#[derive(Debug, Default)]
pub struct WaitingList {
    order: VecDeque<ParticipantId>,
    members: HashSet<ParticipantId>,
}

impl WaitingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail. Returns false if already present.
    pub fn offer(&mut self, id: ParticipantId) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.order.push_back(id);
        true
    }

    /// Remove wherever it is. Returns false if absent.
    pub fn remove(&mut self, id: &ParticipantId) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.order.retain(|queued| queued != id);
        true
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.members.contains(id)
    }

    /// 1-based position from the head.
    pub fn position(&self, id: &ParticipantId) -> Option<usize> {
        if !self.contains(id) {
            return None;
        }
        self.order.iter().position(|queued| queued == id).map(|i| i + 1)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entry at a 0-based index.
    pub fn get(&self, index: usize) -> Option<ParticipantId> {
        self.order.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParticipantId> {
        self.order.iter()
    }
}
