// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Signed and unsigned events
//!
//! The id of an event is the hex SHA-256 of the compact JSON array
//! `[0, pubkey, created_at, kind, tags, content]`; the signature is a Schnorr
//! signature over those 32 id bytes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::{sign_id, verify_id, CryptoError};
use crate::keys::{KeyError, Keys, PublicKey};

/// Tag list: each tag is `[name, value, ...]`
pub type Tags = Vec<Vec<String>>;

/// Compute the hex event id for the given fields
pub fn compute_id(pubkey: &str, created_at: u64, kind: u16, tags: &Tags, content: &str) -> String {
    let serialized = serde_json::json!([0, pubkey, created_at, kind, tags, content]).to_string();
    hex::encode(Sha256::digest(serialized.as_bytes()))
}

fn first_tag_value<'a>(tags: &'a Tags, name: &str) -> Option<&'a str> {
    tags.iter()
        .find(|tag| tag.first().map(String::as_str) == Some(name))
        .and_then(|tag| tag.get(1))
        .map(String::as_str)
}

fn decode_id(id: &str) -> Result<[u8; 32], CryptoError> {
    let bytes = hex::decode(id)?;
    if bytes.len() != 32 {
        return Err(CryptoError::InvalidPayload {
            field: "id".to_string(),
            reason: format!("expected 32 bytes, got {}", bytes.len()),
        });
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// A signed event as stored and relayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u16,
    pub tags: Tags,
    pub content: String,
    pub sig: String,
}

impl Event {
    /// Recompute the id and check the signature against `pubkey`
    pub fn verify(&self) -> Result<(), CryptoError> {
        let computed = compute_id(&self.pubkey, self.created_at, self.kind, &self.tags, &self.content);
        if computed != self.id {
            return Err(CryptoError::InvalidSignature {
                operation: "verify_event".to_string(),
                reason: "event id does not match its contents".to_string(),
            });
        }

        let author = PublicKey::from_hex(&self.pubkey).map_err(|e| CryptoError::InvalidKey {
            key_type: "event_pubkey".to_string(),
            reason: e.to_string(),
        })?;
        let sig = hex::decode(&self.sig)?;
        verify_id(&author, &decode_id(&self.id)?, &sig)
    }

    pub fn author(&self) -> Result<PublicKey, KeyError> {
        PublicKey::from_hex(&self.pubkey)
    }

    /// Value of the first tag named `name`
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        first_tag_value(&self.tags, name)
    }

    /// Values of every tag named `name`
    pub fn tag_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |tag| tag.first().map(String::as_str) == Some(name))
            .filter_map(|tag| tag.get(1).map(String::as_str))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// An event without a signature (a rumor, or an event about to be signed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u16,
    pub tags: Tags,
    pub content: String,
}

impl UnsignedEvent {
    pub fn new(author: &PublicKey, created_at: u64, kind: u16, tags: Tags, content: String) -> Self {
        Self {
            id: None,
            pubkey: author.to_hex(),
            created_at,
            kind,
            tags,
            content,
        }
    }

    pub fn compute_id(&self) -> String {
        compute_id(&self.pubkey, self.created_at, self.kind, &self.tags, &self.content)
    }

    /// Fill in the id field (rumors carry an id but no signature)
    pub fn with_id(mut self) -> Self {
        self.id = Some(self.compute_id());
        self
    }

    /// True when the id is absent or matches the contents
    pub fn id_matches(&self) -> bool {
        match &self.id {
            Some(id) => *id == self.compute_id(),
            None => true,
        }
    }

    pub fn tag_value(&self, name: &str) -> Option<&str> {
        first_tag_value(&self.tags, name)
    }

    /// Sign with `keys`, which must own `pubkey`
    pub fn sign(self, keys: &Keys) -> Result<Event, CryptoError> {
        if self.pubkey != keys.public_key().to_hex() {
            return Err(CryptoError::InvalidKey {
                key_type: "signing_key".to_string(),
                reason: "signing key does not match event pubkey".to_string(),
            });
        }

        let id = self.compute_id();
        let sig = sign_id(keys, &decode_id(&id)?)?;

        Ok(Event {
            id,
            pubkey: self.pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig: hex::encode(sig),
        })
    }
}
