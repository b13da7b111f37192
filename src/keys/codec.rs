// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bech32 key codec
//!
//! Encodes 32-byte keys as checksummed bech32 strings with the `npub`
//! (public) or `nsec` (secret) human-readable prefix. Decoding verifies the
//! character set and the checksum over the full string before the prefix is
//! looked at, then checks the prefix against the requested kind.

use std::fmt;

use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32, Hrp};

use super::error::KeyError;

/// Which half of an identity a bech32 string encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// `npub…`
    Public,
    /// `nsec…`
    Secret,
}

impl KeyKind {
    /// Human-readable prefix for this kind
    pub fn prefix(self) -> &'static str {
        match self {
            KeyKind::Public => "npub",
            KeyKind::Secret => "nsec",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "npub" => Some(KeyKind::Public),
            "nsec" => Some(KeyKind::Secret),
            _ => None,
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Encode 32 key bytes as a bech32 string of the given kind
pub fn encode(bytes: &[u8; 32], kind: KeyKind) -> Result<String, KeyError> {
    let hrp = Hrp::parse(kind.prefix()).map_err(|e| KeyError::encoding(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, bytes).map_err(|e| KeyError::encoding(e.to_string()))
}

/// Decode a bech32 key string, requiring the given kind
///
/// # Errors
///
/// - `InvalidEncoding` for bad charset, checksum failure, unknown prefix or a
///   payload that is not exactly 32 bytes
/// - `KindMismatch` when the string is a valid key of the other kind
pub fn decode(encoded: &str, kind: KeyKind) -> Result<[u8; 32], KeyError> {
    let checked = CheckedHrpstring::new::<Bech32>(encoded.trim())
        .map_err(|e| KeyError::encoding(e.to_string()))?;

    let prefix = checked.hrp().to_string().to_lowercase();
    match KeyKind::from_prefix(&prefix) {
        Some(found) if found == kind => {}
        Some(found) => {
            return Err(KeyError::KindMismatch {
                expected: kind,
                found,
            })
        }
        None => {
            return Err(KeyError::encoding(format!("unknown prefix '{}'", prefix)));
        }
    }

    let data: Vec<u8> = checked.byte_iter().collect();
    if data.len() != 32 {
        return Err(KeyError::encoding(format!(
            "expected 32 bytes of key data, got {}",
            data.len()
        )));
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(&data);
    Ok(key)
}

/// Kind suggested by the string's prefix, without validating anything else
pub fn detect_kind(encoded: &str) -> Option<KeyKind> {
    let lower = encoded.trim().to_lowercase();
    if lower.starts_with("npub1") {
        Some(KeyKind::Public)
    } else if lower.starts_with("nsec1") {
        Some(KeyKind::Secret)
    } else {
        None
    }
}
