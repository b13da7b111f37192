// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Relay trait definition

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::RelayError;
use super::message::RelayMessage;
use crate::event::{Event, Filter};

/// Machine-readable prefix a relay uses when it already stores an event
pub const DUPLICATE_PREFIX: &str = "duplicate:";

/// A single relay endpoint
///
/// Implementations open one subscription per call; dropping the returned
/// receiver ends the subscription on the relay.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Relay URL, used for logging and outcome reporting
    fn url(&self) -> &str;

    /// Send `REQ` and stream back whatever the relay answers
    async fn subscribe(
        &self,
        subscription_id: &str,
        filters: Vec<Filter>,
    ) -> Result<mpsc::Receiver<RelayMessage>, RelayError>;

    /// Send an event and wait for the relay's `OK`
    async fn publish(&self, event: &Event) -> Result<(), RelayError>;
}

/// Map an `OK` reply onto a publish result; duplicates count as stored
pub(crate) fn ok_to_result(relay: &str, accepted: bool, message: &str) -> Result<(), RelayError> {
    if accepted || message.starts_with(DUPLICATE_PREFIX) {
        Ok(())
    } else {
        Err(RelayError::Rejected {
            relay: relay.to_string(),
            reason: message.to_string(),
        })
    }
}
