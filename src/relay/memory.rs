// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-process relay
//!
//! Stores events in memory and answers subscriptions from that store. Used by
//! tests and local tooling; supports failure injection so retry, dedupe and
//! resolution paths can run without a network.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use super::error::RelayError;
use super::message::RelayMessage;
use super::transport::{ok_to_result, Relay, DUPLICATE_PREFIX};
use crate::event::{kind, Event, Filter};
use crate::giftwrap::deletion_targets;

#[derive(Debug, Default)]
struct MemoryState {
    events: Vec<Event>,
    offline: bool,
    hold_open: bool,
    failing_publishes: usize,
    publish_attempts: usize,
}

#[derive(Debug)]
pub struct MemoryRelay {
    url: String,
    state: RwLock<MemoryState>,
}

impl MemoryRelay {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: RwLock::new(MemoryState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store an event as-is, bypassing verification (stale, duplicate or garbage data)
    pub fn inject(&self, event: Event) {
        self.write().events.push(event);
    }

    /// While offline, every subscribe and publish fails to connect
    pub fn set_offline(&self, offline: bool) {
        self.write().offline = offline;
    }

    /// Keep subscriptions open after stored events, without sending `EOSE`
    pub fn set_hold_open(&self, hold_open: bool) {
        self.write().hold_open = hold_open;
    }

    /// Reject the next `count` publishes
    pub fn fail_next_publishes(&self, count: usize) {
        self.write().failing_publishes = count;
    }

    /// Publishes received so far, including failed ones
    pub fn publish_attempts(&self) -> usize {
        self.read().publish_attempts
    }

    pub fn events(&self) -> Vec<Event> {
        self.read().events.clone()
    }

    pub fn len(&self) -> usize {
        self.read().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().events.is_empty()
    }

    fn offline_error(&self) -> RelayError {
        RelayError::Connection {
            relay: self.url.clone(),
            reason: "relay offline".to_string(),
        }
    }
}

/// A deletion is honored for events the requester signed or that were wrapped for them
fn may_delete(requester: &str, target: &Event) -> bool {
    target.pubkey == requester
        || (target.kind == kind::GIFT_WRAP && target.tag_values("p").any(|p| p == requester))
}

fn apply_deletion(events: &mut Vec<Event>, deletion: &Event) -> usize {
    let targets = deletion_targets(deletion);
    let before = events.len();
    events.retain(|e| !(targets.contains(&e.id) && may_delete(&deletion.pubkey, e)));
    before - events.len()
}

fn matching(events: &[Event], filters: &[Filter]) -> Vec<Event> {
    let mut out = Vec::new();
    for filter in filters {
        let mut hits: Vec<&Event> = events.iter().filter(|e| filter.matches(e)).collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filter.limit {
            hits.truncate(limit);
        }
        out.extend(hits.into_iter().cloned());
    }
    out
}

#[async_trait]
impl Relay for MemoryRelay {
    fn url(&self) -> &str {
        &self.url
    }

    async fn subscribe(
        &self,
        subscription_id: &str,
        filters: Vec<Filter>,
    ) -> Result<mpsc::Receiver<RelayMessage>, RelayError> {
        let (hits, hold_open) = {
            let state = self.read();
            if state.offline {
                return Err(self.offline_error());
            }
            (matching(&state.events, &filters), state.hold_open)
        };

        let (tx, rx) = mpsc::channel(hits.len() + 1);
        for event in hits {
            let _ = tx.try_send(RelayMessage::Event {
                subscription_id: subscription_id.to_string(),
                event: Box::new(event),
            });
        }

        if hold_open {
            tokio::spawn(async move { tx.closed().await });
        } else {
            let _ = tx.try_send(RelayMessage::Eose {
                subscription_id: subscription_id.to_string(),
            });
        }
        Ok(rx)
    }

    async fn publish(&self, event: &Event) -> Result<(), RelayError> {
        let mut state = self.write();
        state.publish_attempts += 1;

        if state.offline {
            return Err(self.offline_error());
        }
        if state.failing_publishes > 0 {
            state.failing_publishes -= 1;
            return ok_to_result(&self.url, false, "error: injected failure");
        }
        if let Err(e) = event.verify() {
            return ok_to_result(&self.url, false, &format!("invalid: {}", e));
        }
        if state.events.iter().any(|e| e.id == event.id) {
            return ok_to_result(&self.url, false, &format!("{} already have it", DUPLICATE_PREFIX));
        }

        if event.kind == kind::DELETION {
            let removed = apply_deletion(&mut state.events, event);
            debug!("{}: deletion {} removed {} events", self.url, event.id, removed);
        }
        state.events.push(event.clone());
        Ok(())
    }
}
