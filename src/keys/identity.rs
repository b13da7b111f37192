// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Identity keys
//!
//! An identity is a secp256k1 keypair. The public half travels as a 32-byte
//! x-only point (BIP-340 style), either hex-encoded or as an `npub` string.

use std::fmt;
use std::str::FromStr;

use k256::schnorr::{SigningKey, VerifyingKey};
use rand::{rngs::OsRng, RngCore};

use super::codec::{self, KeyKind};
use super::error::KeyError;

/// x-only secp256k1 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Build from raw x-only bytes, checking the point lies on the curve
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != 32 {
            return Err(KeyError::InvalidKey {
                key_type: "public_key",
                reason: format!("expected 32 bytes, got {}", bytes.len()),
            });
        }
        VerifyingKey::from_bytes(bytes).map_err(|e| KeyError::InvalidKey {
            key_type: "public_key",
            reason: e.to_string(),
        })?;

        let mut key = [0u8; 32];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Parse a 64-character hex public key
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| KeyError::encoding(format!("hex decode error: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Parse an `npub…` string
    pub fn from_bech32(encoded: &str) -> Result<Self, KeyError> {
        let bytes = codec::decode(encoded, KeyKind::Public)?;
        Self::from_bytes(&bytes)
    }

    /// Parse either an `npub…` string or a hex key
    pub fn parse(input: &str) -> Result<Self, KeyError> {
        match codec::detect_kind(input) {
            Some(_) => Self::from_bech32(input),
            None => Self::from_hex(input),
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn to_bech32(&self) -> Result<String, KeyError> {
        codec::encode(&self.0, KeyKind::Public)
    }

    pub(crate) fn verifying_key(&self) -> Result<VerifyingKey, KeyError> {
        VerifyingKey::from_bytes(&self.0).map_err(|e| KeyError::InvalidKey {
            key_type: "public_key",
            reason: e.to_string(),
        })
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A full identity: secret scalar plus its x-only public key
#[derive(Clone)]
pub struct Keys {
    secret: k256::SecretKey,
    signing: SigningKey,
    public: PublicKey,
}

impl Keys {
    /// Generate a fresh random identity
    pub fn generate() -> Self {
        loop {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            // Out-of-range scalars are astronomically rare; draw again if one shows up.
            if let Ok(keys) = Self::from_secret_bytes(&bytes) {
                return keys;
            }
        }
    }

    /// Build from raw 32-byte secret key material
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != 32 {
            return Err(KeyError::InvalidKey {
                key_type: "secret_key",
                reason: format!("expected 32 bytes, got {}", bytes.len()),
            });
        }
        let secret = k256::SecretKey::from_slice(bytes).map_err(|e| KeyError::InvalidKey {
            key_type: "secret_key",
            reason: e.to_string(),
        })?;
        let signing = SigningKey::from_bytes(bytes).map_err(|e| KeyError::InvalidKey {
            key_type: "secret_key",
            reason: e.to_string(),
        })?;

        let mut x_only = [0u8; 32];
        x_only.copy_from_slice(&signing.verifying_key().to_bytes());

        Ok(Self {
            secret,
            signing,
            public: PublicKey(x_only),
        })
    }

    /// Parse an `nsec…` string
    pub fn from_nsec(encoded: &str) -> Result<Self, KeyError> {
        let bytes = codec::decode(encoded, KeyKind::Secret)?;
        Self::from_secret_bytes(&bytes)
    }

    /// Parse either an `nsec…` string or a hex secret (optionally `0x`-prefixed)
    pub fn parse(input: &str) -> Result<Self, KeyError> {
        let input = input.trim();
        if codec::detect_kind(input).is_some() {
            return Self::from_nsec(input);
        }
        let hex_str = input.strip_prefix("0x").unwrap_or(input);
        let bytes = hex::decode(hex_str)
            .map_err(|e| KeyError::encoding(format!("hex decode error: {}", e)))?;
        Self::from_secret_bytes(&bytes)
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Raw secret bytes. Never log these.
    pub fn secret_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.secret.to_bytes());
        out
    }

    pub fn to_nsec(&self) -> Result<String, KeyError> {
        codec::encode(&self.secret_bytes(), KeyKind::Secret)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing
    }
}

impl fmt::Debug for Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keys")
            .field("public", &self.public)
            .field("secret", &"<redacted>")
            .finish()
    }
}
