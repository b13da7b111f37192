// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Authenticated Encryption Layer
//!
//! Point-to-point encryption between two identities, used by every layer of
//! a gift wrap:
//!
//! - **ECDH**: secp256k1 shared x-coordinate, HKDF-extracted into a conversation key
//! - **Encryption**: per-message HKDF expansion, ChaCha20, HMAC-SHA256
//! - **Signature**: BIP-340 Schnorr over event ids
//!
//! ## Security Considerations
//!
//! - A fresh random nonce is drawn for every message
//! - The MAC is verified before any byte is decrypted; failures never return plaintext
//! - Conversation keys and plaintexts are never logged

pub mod ecdh;
pub mod encryption;
pub mod error;
pub mod signature;

pub use ecdh::derive_conversation_key;
pub use encryption::{decrypt, encrypt};
pub use error::CryptoError;
pub use signature::{sign_id, verify_id};

use crate::keys::{Keys, PublicKey};

fn conversation_key(keys: &Keys, peer: &PublicKey) -> Result<[u8; 32], CryptoError> {
    derive_conversation_key(&keys.secret_bytes(), peer.as_bytes()).map_err(|e| {
        CryptoError::KeyDerivationFailed {
            operation: "conversation_key".to_string(),
            reason: e.to_string(),
        }
    })
}

/// Encrypt `plaintext` from `sender` to `recipient`
pub fn encrypt_to(sender: &Keys, recipient: &PublicKey, plaintext: &str) -> Result<String, CryptoError> {
    encrypt(&conversation_key(sender, recipient)?, plaintext)
}

/// Decrypt a payload `sender` encrypted to `receiver`
pub fn decrypt_from(receiver: &Keys, sender: &PublicKey, payload: &str) -> Result<String, CryptoError> {
    decrypt(&conversation_key(receiver, sender)?, payload)
}
