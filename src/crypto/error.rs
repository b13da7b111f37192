// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Types
//!
//! Error type shared by the conversation-key derivation, the payload cipher and
//! the Schnorr signature helpers.
//!
//! ## Error Variants
//!
//! - **DecryptionFailed**: payload rejected (wrong key, tampered or truncated ciphertext, MAC mismatch)
//! - **EncryptionFailed**: plaintext could not be encrypted (empty, too long)
//! - **InvalidSignature**: Schnorr signature malformed or not matching the event id
//! - **InvalidKey**: key bytes do not describe a valid secp256k1 scalar or x-only point
//! - **KeyDerivationFailed**: ECDH or HKDF step failed
//! - **InvalidPayload**: payload framing is wrong (bad base64, unknown version, bad length)
//! - **Other**: library errors that do not fit the above
//!
//! ## Context Preservation
//!
//! Every variant carries the operation or key type involved so the caller can
//! tell which layer of a gift wrap failed without inspecting plaintext.

use std::fmt;

/// Error type for all cryptographic operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Authenticated decryption failed
    ///
    /// This error occurs when:
    /// - MAC verification fails (ciphertext tampered or wrong conversation key)
    /// - Padding is inconsistent after decryption
    /// - Payload is truncated
    DecryptionFailed {
        /// Which operation was being performed
        operation: String,
        /// Specific failure reason
        reason: String,
    },

    /// Plaintext was rejected before encryption
    EncryptionFailed {
        /// Which operation was being performed
        operation: String,
        /// Specific failure reason
        reason: String,
    },

    /// Schnorr signature verification failed
    InvalidSignature {
        /// Which operation was being performed
        operation: String,
        /// Specific failure reason
        reason: String,
    },

    /// Invalid cryptographic key
    ///
    /// This error occurs when:
    /// - Key has wrong length
    /// - Key is not a valid curve point or scalar
    InvalidKey {
        /// Type of key that failed (e.g., "public_key", "secret_key")
        key_type: String,
        /// Specific failure reason
        reason: String,
    },

    /// Key derivation failed (ECDH or HKDF)
    KeyDerivationFailed {
        /// Which key derivation operation failed
        operation: String,
        /// Specific failure reason
        reason: String,
    },

    /// Payload framing validation failed
    InvalidPayload {
        /// Which field failed validation
        field: String,
        /// Specific failure reason
        reason: String,
    },

    /// Generic error for library errors or unexpected failures
    Other(String),
}

impl CryptoError {
    /// Shorthand used by the payload cipher, where every failure is a decryption failure.
    pub(crate) fn decryption(reason: impl Into<String>) -> Self {
        CryptoError::DecryptionFailed {
            operation: "decrypt_payload".to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::DecryptionFailed { operation, reason } => {
                write!(f, "Decryption failed during {}: {}", operation, reason)
            }
            CryptoError::EncryptionFailed { operation, reason } => {
                write!(f, "Encryption failed during {}: {}", operation, reason)
            }
            CryptoError::InvalidSignature { operation, reason } => {
                write!(f, "Invalid signature during {}: {}", operation, reason)
            }
            CryptoError::InvalidKey { key_type, reason } => {
                write!(f, "Invalid key ({}): {}", key_type, reason)
            }
            CryptoError::KeyDerivationFailed { operation, reason } => {
                write!(f, "Key derivation failed during {}: {}", operation, reason)
            }
            CryptoError::InvalidPayload { field, reason } => {
                write!(f, "Invalid payload field '{}': {}", field, reason)
            }
            CryptoError::Other(msg) => {
                write!(f, "Crypto error: {}", msg)
            }
        }
    }
}

impl std::error::Error for CryptoError {}

// Conversion from hex decode errors
impl From<hex::FromHexError> for CryptoError {
    fn from(err: hex::FromHexError) -> Self {
        CryptoError::InvalidPayload {
            field: "hex_field".to_string(),
            reason: format!("hex decode error: {}", err),
        }
    }
}
