// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Key decoding errors

use thiserror::Error;

use super::codec::KeyKind;

/// Errors raised while decoding or constructing identity keys
///
/// `KindMismatch` is reported only for well-formed strings of the other kind,
/// so callers can tell "wrong key type" apart from "corrupt key".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Malformed input: bad charset, bad checksum, unknown prefix, wrong length
    #[error("Invalid key encoding: {reason}")]
    InvalidEncoding {
        /// Why the input was rejected
        reason: String,
    },

    /// A valid key of the other kind was supplied (e.g. npub where nsec was expected)
    #[error("Key kind mismatch: expected {expected}, got {found}")]
    KindMismatch {
        /// Kind the caller asked for
        expected: KeyKind,
        /// Kind found in the input
        found: KeyKind,
    },

    /// Bytes decoded fine but are not a valid secp256k1 key
    #[error("Invalid key material ({key_type}): {reason}")]
    InvalidKey {
        /// "public_key" or "secret_key"
        key_type: &'static str,
        /// Underlying curve error
        reason: String,
    },
}

impl KeyError {
    pub(crate) fn encoding(reason: impl Into<String>) -> Self {
        KeyError::InvalidEncoding {
            reason: reason.into(),
        }
    }
}
