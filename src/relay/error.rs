// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Relay transport errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// Could not reach the relay
    #[error("Connection to {relay} failed: {reason}")]
    Connection {
        /// Relay URL
        relay: String,
        /// Underlying transport error
        reason: String,
    },

    /// Relay sent something that is not a valid protocol message
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// No answer within the per-attempt bound
    #[error("{relay} timed out after {timeout_ms}ms")]
    Timeout {
        /// Relay URL
        relay: String,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Relay answered `OK false`
    #[error("{relay} rejected event: {reason}")]
    Rejected {
        /// Relay URL
        relay: String,
        /// Machine-readable prefix and message from the relay
        reason: String,
    },

    /// No relay acknowledged within the retry budget
    #[error("Publish of {event_id} not acknowledged after {attempts} attempts: {last_error}")]
    PublishTimeout {
        /// Event that could not be published
        event_id: String,
        /// Attempts made
        attempts: u32,
        /// Per-relay failures of the final attempt
        last_error: String,
    },

    #[error("No relays configured")]
    NoRelaysConfigured,

    #[error("Invalid relay URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Rate limited")]
    RateLimited,
}
