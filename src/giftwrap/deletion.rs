// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Advisory deletion requests (kind 5)
//!
//! Relays may ignore these. Logical deletion is guaranteed only by tombstones.

use super::signer::Signer;
use super::GiftWrapError;
use crate::event::{kind, unix_now, Event, Tags, UnsignedEvent};
use crate::keys::{Keys, PublicKey};

fn deletion_request(author: &PublicKey, event_ids: &[String], reason: Option<&str>) -> Result<UnsignedEvent, GiftWrapError> {
    if event_ids.is_empty() {
        return Err(GiftWrapError::WrapFailed("deletion request needs at least one event id".to_string()));
    }

    let mut tags: Tags = Vec::with_capacity(event_ids.len() + 1);
    for id in event_ids {
        if id.len() != 64 || hex::decode(id).is_err() {
            return Err(GiftWrapError::WrapFailed(format!("'{}' is not an event id", id)));
        }
        tags.push(vec!["e".to_string(), id.clone()]);
    }
    tags.push(vec!["k".to_string(), kind::GIFT_WRAP.to_string()]);

    Ok(UnsignedEvent::new(
        author,
        unix_now(),
        kind::DELETION,
        tags,
        reason.unwrap_or_default().to_string(),
    ))
}

/// Signed request asking relays to erase the listed gift wraps
pub fn create_deletion_request(event_ids: &[String], keys: &Keys, reason: Option<&str>) -> Result<Event, GiftWrapError> {
    Ok(deletion_request(&keys.public_key(), event_ids, reason)?.sign(keys)?)
}

pub async fn create_deletion_request_with_signer(
    event_ids: &[String],
    signer: &dyn Signer,
    reason: Option<&str>,
) -> Result<Event, GiftWrapError> {
    signer
        .sign_event(deletion_request(&signer.public_key(), event_ids, reason)?)
        .await
}

/// Event ids targeted by a deletion request; empty for other kinds
pub fn deletion_targets(event: &Event) -> Vec<String> {
    if event.kind != kind::DELETION {
        return Vec::new();
    }
    event.tag_values("e").map(str::to_string).collect()
}
