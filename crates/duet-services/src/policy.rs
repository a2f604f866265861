//! Pairing eligibility — the hook the matching engine consults before
//! committing a session.
//!
//! The default policy admits every pair, which makes matching strict
//! arrival order. `BlockList` refuses pairs of display names that were
//! blocked by an operator; it only applies when both sides set a name.

use std::sync::Arc;

use dashmap::DashSet;

use duet_core::ParticipantId;

/// What a policy is allowed to see of a waiting participant.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub id: ParticipantId,
    pub name: Option<&'a str>,
}

pub trait PairingPolicy: Send + Sync {
    fn can_pair(&self, a: &Candidate<'_>, b: &Candidate<'_>) -> bool;
}

/// Every pair is eligible.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PairingPolicy for AllowAll {
    fn can_pair(&self, _a: &Candidate<'_>, _b: &Candidate<'_>) -> bool {
        true
    }
}

/// Unordered display-name pairs that must never be matched.
#[derive(Clone, Default)]
pub struct BlockList {
    pairs: Arc<DashSet<(String, String)>>,
}

fn key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from config `blocked_pairs`.
    pub fn from_pairs(pairs: &[[String; 2]]) -> Self {
        let list = Self::new();
        for [a, b] in pairs {
            list.block(a, b);
        }
        list
    }

    /// Returns false if the pair was already blocked.
    pub fn block(&self, a: &str, b: &str) -> bool {
        let added = self.pairs.insert(key(a, b));
        if added {
            tracing::info!(a, b, "pair blocked");
        }
        added
    }

    pub fn unblock(&self, a: &str, b: &str) -> bool {
        self.pairs.remove(&key(a, b)).is_some()
    }

    pub fn is_blocked(&self, a: &str, b: &str) -> bool {
        self.pairs.contains(&key(a, b))
    }

    /// Snapshot, sorted for stable output.
    pub fn list(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = self.pairs.iter().map(|p| p.key().clone()).collect();
        pairs.sort();
        pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl PairingPolicy for BlockList {
    fn can_pair(&self, a: &Candidate<'_>, b: &Candidate<'_>) -> bool {
        match (a.name, b.name) {
            (Some(x), Some(y)) => !self.is_blocked(x, y),
            _ => true,
        }
    }
}
