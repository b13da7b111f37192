// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Subscription filters

use serde::{Deserialize, Serialize};

use super::model::Event;
use crate::keys::PublicKey;

/// Query filter sent in a `REQ`; all present conditions must hold
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<u16>>,
    #[serde(rename = "#p", default, skip_serializing_if = "Option::is_none")]
    pub p_tags: Option<Vec<String>>,
    #[serde(rename = "#e", default, skip_serializing_if = "Option::is_none")]
    pub e_tags: Option<Vec<String>>,
    #[serde(rename = "#d", default, skip_serializing_if = "Option::is_none")]
    pub d_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: u16) -> Self {
        self.kinds.get_or_insert_with(Vec::new).push(kind);
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.ids.get_or_insert_with(Vec::new).push(id.into());
        self
    }

    pub fn author(mut self, author: &PublicKey) -> Self {
        self.authors.get_or_insert_with(Vec::new).push(author.to_hex());
        self
    }

    /// Events tagging `recipient` with a `p` tag
    pub fn pubkey_tag(mut self, recipient: &PublicKey) -> Self {
        self.p_tags.get_or_insert_with(Vec::new).push(recipient.to_hex());
        self
    }

    pub fn since(mut self, since: u64) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: u64) -> Self {
        self.until = Some(until);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Local evaluation, used by in-process relays (`limit` is applied by the caller)
    pub fn matches(&self, event: &Event) -> bool {
        fn contains(list: &Option<Vec<String>>, value: &str) -> bool {
            list.as_ref().map_or(true, |values| values.iter().any(|v| v == value))
        }
        fn tag_matches(list: &Option<Vec<String>>, event: &Event, name: &str) -> bool {
            list.as_ref().map_or(true, |values| {
                event.tag_values(name).any(|tag| values.iter().any(|v| v == tag))
            })
        }

        contains(&self.ids, &event.id)
            && contains(&self.authors, &event.pubkey)
            && self.kinds.as_ref().map_or(true, |kinds| kinds.contains(&event.kind))
            && tag_matches(&self.p_tags, event, "p")
            && tag_matches(&self.e_tags, event, "e")
            && tag_matches(&self.d_tags, event, "d")
            && self.since.map_or(true, |since| event.created_at >= since)
            && self.until.map_or(true, |until| event.created_at <= until)
    }
}
