// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Secret store errors

use thiserror::Error;

use crate::giftwrap::GiftWrapError;
use crate::keys::KeyError;
use crate::relay::RelayError;
use crate::secrets::{BundleError, IdentifierError};

#[derive(Debug, Error)]
pub enum StoreError {
    /// An operation was attempted before `connect`, or with an empty relay set
    #[error("No relays configured")]
    NoRelaysConfigured,

    #[error(transparent)]
    Relay(RelayError),

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    GiftWrap(#[from] GiftWrapError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<RelayError> for StoreError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::NoRelaysConfigured => StoreError::NoRelaysConfigured,
            other => StoreError::Relay(other),
        }
    }
}

impl StoreError {
    /// No relay acknowledged a publish within the retry budget
    pub fn is_publish_timeout(&self) -> bool {
        matches!(self, StoreError::Relay(RelayError::PublishTimeout { .. }))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
