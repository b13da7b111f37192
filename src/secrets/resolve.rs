// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Resolution Engine
//!
//! Candidates are grouped by identifier and the one with the greatest rumor
//! timestamp wins. On equal timestamps the first candidate observed is kept,
//! so the outcome depends on arrival order. Outer gift-wrap timestamps are
//! randomized and never consulted.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use super::bundle::SecretBundle;
use super::identifier::Identifier;
use crate::giftwrap::Unwrapped;
use crate::keys::PublicKey;

/// Authoritative state for one identifier
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedState {
    pub identifier: Identifier,
    pub bundle: SecretBundle,
    /// Rumor timestamp of the winning candidate
    pub created_at: u64,
    pub author: PublicKey,
    /// Gift wrap that carried the winner
    pub wrap_id: String,
    /// Distinct candidates seen for this identifier
    pub candidates: usize,
    /// Gift wraps that lost to the winner
    pub superseded: Vec<String>,
}

impl ResolvedState {
    fn from_candidate(identifier: Identifier, candidate: Unwrapped) -> Self {
        Self {
            identifier,
            bundle: candidate.bundle,
            created_at: candidate.created_at,
            author: candidate.author,
            wrap_id: candidate.wrap_id,
            candidates: 1,
            superseded: Vec::new(),
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.bundle.is_tombstone()
    }
}

/// Incremental fold over unwrapped candidates; `snapshot` can be taken at any point
#[derive(Debug, Default, Clone)]
pub struct Resolver {
    states: BTreeMap<Identifier, ResolvedState>,
    /// Wrap ids already folded in, across all identifiers
    seen: HashSet<String>,
    rejected: usize,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one candidate in. Returns true when it became the current winner.
    pub fn observe(&mut self, candidate: Unwrapped) -> bool {
        let Some(identifier) = Identifier::parse(&candidate.d_tag) else {
            warn!(
                "Excluding candidate {}: malformed identifier {:?}",
                candidate.wrap_id, candidate.d_tag
            );
            self.rejected += 1;
            return false;
        };

        if !self.seen.insert(candidate.wrap_id.clone()) {
            return false;
        }

        match self.states.entry(identifier) {
            Entry::Vacant(slot) => {
                let identifier = slot.key().clone();
                slot.insert(ResolvedState::from_candidate(identifier, candidate));
                true
            }
            Entry::Occupied(mut slot) => {
                let state = slot.get_mut();
                state.candidates += 1;

                if candidate.created_at > state.created_at {
                    debug!(
                        "{}: {} supersedes {} ({} > {})",
                        state.identifier, candidate.wrap_id, state.wrap_id, candidate.created_at, state.created_at
                    );
                    let mut superseded = std::mem::take(&mut state.superseded);
                    superseded.push(state.wrap_id.clone());
                    let candidates = state.candidates;
                    *state = ResolvedState::from_candidate(state.identifier.clone(), candidate);
                    state.candidates = candidates;
                    state.superseded = superseded;
                    true
                } else {
                    state.superseded.push(candidate.wrap_id);
                    false
                }
            }
        }
    }

    pub fn get(&self, identifier: &Identifier) -> Option<&ResolvedState> {
        self.states.get(identifier)
    }

    /// Copy of the current resolved map
    pub fn snapshot(&self) -> BTreeMap<Identifier, ResolvedState> {
        self.states.clone()
    }

    pub fn into_states(self) -> BTreeMap<Identifier, ResolvedState> {
        self.states
    }

    /// Candidates excluded for malformed identifiers
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// One-shot resolution of a candidate sequence
pub fn resolve<I>(candidates: I) -> BTreeMap<Identifier, ResolvedState>
where
    I: IntoIterator<Item = Unwrapped>,
{
    let mut resolver = Resolver::new();
    for candidate in candidates {
        resolver.observe(candidate);
    }
    resolver.into_states()
}
