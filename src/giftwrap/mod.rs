// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Gift-Wrap Engine
//!
//! A secret bundle travels in three layers:
//!
//! 1. **Rumor**: unsigned addressable event, `d` tag = identifier, content = bundle JSON,
//!    `created_at` = the true logical time
//! 2. **Seal** (kind 13): the rumor encrypted to the recipient and signed by the author
//! 3. **Gift wrap** (kind 1059): the seal encrypted again by a one-time key, tagged with
//!    the recipient, timestamp pushed back by a random amount
//!
//! Only the gift wrap ever reaches a relay. The outer timestamps are randomized on
//! purpose and must never be used for ordering.

use std::fmt;

use thiserror::Error;

use crate::crypto::CryptoError;
use crate::keys::PublicKey;
use crate::secrets::{BundleError, IdentifierError, SecretBundle};

pub mod deletion;
pub mod signer;
pub mod wrap;

pub use deletion::{create_deletion_request, create_deletion_request_with_signer, deletion_targets};
pub use signer::{unwrap_with_signer, wrap_with_signer, Signer};
pub use wrap::{create_tombstone, unwrap, wrap, wrap_at};

/// Upper bound for the random backdating of seal and wrap timestamps (2 days)
pub const MAX_TIMESTAMP_TWEAK: u64 = 2 * 24 * 60 * 60;

/// Step of the unwrap pipeline that rejected an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnwrapStage {
    OuterEnvelope,
    OuterDecrypt,
    SealParse,
    SealSignature,
    InnerDecrypt,
    RumorParse,
    Identifier,
    Bundle,
}

impl fmt::Display for UnwrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnwrapStage::OuterEnvelope => "outer envelope",
            UnwrapStage::OuterDecrypt => "outer decrypt",
            UnwrapStage::SealParse => "seal parse",
            UnwrapStage::SealSignature => "seal signature",
            UnwrapStage::InnerDecrypt => "inner decrypt",
            UnwrapStage::RumorParse => "rumor parse",
            UnwrapStage::Identifier => "identifier",
            UnwrapStage::Bundle => "bundle",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum GiftWrapError {
    #[error("Unwrap failed at {stage}: {reason}")]
    UnwrapFailed { stage: UnwrapStage, reason: String },

    #[error("Wrap failed: {0}")]
    WrapFailed(String),

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Signer error: {0}")]
    Signer(String),
}

impl GiftWrapError {
    pub(crate) fn unwrap_failed(stage: UnwrapStage, reason: impl fmt::Display) -> Self {
        GiftWrapError::UnwrapFailed {
            stage,
            reason: reason.to_string(),
        }
    }

    /// Stage at which an unwrap was rejected, if this is an unwrap failure
    pub fn stage(&self) -> Option<UnwrapStage> {
        match self {
            GiftWrapError::UnwrapFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// A successfully opened gift wrap
#[derive(Debug, Clone, PartialEq)]
pub struct Unwrapped {
    pub bundle: SecretBundle,
    /// Raw `d` tag; may still be a malformed identifier
    pub d_tag: String,
    /// Rumor timestamp, the only valid ordering key
    pub created_at: u64,
    /// Seal signer, equal to the rumor author
    pub author: PublicKey,
    /// Id of the outer gift wrap event
    pub wrap_id: String,
}
