// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Relay URL handling

use url::Url;

use crate::relay::RelayError;

/// Relays used when none are configured
pub const DEFAULT_RELAYS: &[&str] = &[
    "wss://relay.damus.io",
    "wss://nos.lol",
    "wss://relay.nostr.band",
];

/// Check that `input` is a `ws://` or `wss://` URL with a host; returns it trimmed
pub fn validate_relay_url(input: &str) -> Result<String, RelayError> {
    let trimmed = input.trim();
    let invalid = |reason: String| RelayError::InvalidUrl {
        url: trimmed.to_string(),
        reason,
    };

    let parsed = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "ws" | "wss" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Split a comma-separated relay list, dropping blanks and duplicates
pub fn parse_relay_list(list: &str) -> Vec<String> {
    let mut relays: Vec<String> = Vec::new();
    for entry in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !relays.iter().any(|r| r == entry) {
            relays.push(entry.to_string());
        }
    }
    relays
}
