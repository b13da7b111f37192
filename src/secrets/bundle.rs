// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Secret bundles
//!
//! A bundle maps secret names to JSON values. Keys are kept sorted so the
//! serialized form is deterministic. A bundle with no keys is a tombstone.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::error::BundleError;

fn secret_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern compiles"))
}

/// True when `key` is a valid secret name
pub fn is_valid_secret_key(key: &str) -> bool {
    secret_key_pattern().is_match(key)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SecretBundle(BTreeMap<String, Value>);

impl SecretBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs, rejecting invalid names
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, BundleError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut bundle = Self::new();
        for (key, value) in pairs {
            bundle.insert(key, value)?;
        }
        Ok(bundle)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// An empty bundle logically deletes its identifier
    pub fn is_tombstone(&self) -> bool {
        self.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert or replace a secret; returns the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<Option<Value>, BundleError> {
        let key = key.into();
        if !is_valid_secret_key(&key) {
            return Err(BundleError::InvalidKey { key });
        }
        Ok(self.0.insert(key, value.into()))
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Shallow merge: keys in `updates` overwrite ours. Neither input changes.
    pub fn merged(&self, updates: &SecretBundle) -> SecretBundle {
        let mut out = self.0.clone();
        out.extend(updates.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        SecretBundle(out)
    }

    /// Copy without the listed keys
    pub fn without<S: AsRef<str>>(&self, keys: &[S]) -> SecretBundle {
        let mut out = self.0.clone();
        for key in keys {
            out.remove(key.as_ref());
        }
        SecretBundle(out)
    }

    pub fn to_json(&self) -> Result<String, BundleError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, BundleError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl TryFrom<BTreeMap<String, Value>> for SecretBundle {
    type Error = BundleError;

    fn try_from(map: BTreeMap<String, Value>) -> Result<Self, Self::Error> {
        if let Some(key) = map.keys().find(|k| !is_valid_secret_key(k)) {
            return Err(BundleError::InvalidKey { key: key.clone() });
        }
        Ok(Self(map))
    }
}

impl<'de> Deserialize<'de> for SecretBundle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, Value>::deserialize(deserializer)?;
        SecretBundle::try_from(map).map_err(serde::de::Error::custom)
    }
}

impl From<SecretBundle> for BTreeMap<String, Value> {
    fn from(bundle: SecretBundle) -> Self {
        bundle.0
    }
}

/// Pure shallow merge; `updates` wins on conflicts
pub fn merge_secrets(existing: &SecretBundle, updates: &SecretBundle) -> SecretBundle {
    existing.merged(updates)
}
