// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECDH Conversation Key Derivation
//!
//! Implements Elliptic Curve Diffie-Hellman over secp256k1 between a secret
//! key and an x-only public key, then extracts a 32-byte conversation key
//! with HKDF-SHA256 (salt `nip44-v2`). The conversation key is symmetric:
//! `derive_conversation_key(a, B) == derive_conversation_key(b, A)`.

use anyhow::{anyhow, Result};
use hkdf::Hkdf;
use k256::{PublicKey, SecretKey};
use sha2::Sha256;

/// HKDF salt binding conversation keys to this payload format
pub const CONVERSATION_KEY_SALT: &[u8] = b"nip44-v2";

/// Derive the conversation key shared by two identities
///
/// # Arguments
///
/// * `secret_key` - Our 32-byte secret key
/// * `peer_public_key` - Peer's public key: 32-byte x-only, or 33/65-byte SEC1
///
/// # Returns
///
/// A 32-byte conversation key used as the HKDF PRK for per-message keys
pub fn derive_conversation_key(secret_key: &[u8], peer_public_key: &[u8]) -> Result<[u8; 32]> {
    // 1. Validate and parse our secret key (32 bytes)
    if secret_key.len() != 32 {
        return Err(anyhow!(
            "Invalid secret key size: expected 32 bytes, got {}",
            secret_key.len()
        ));
    }
    let secret = SecretKey::from_slice(secret_key)
        .map_err(|e| anyhow!("Failed to parse secret key: {}", e))?;

    // 2. Parse the peer key. x-only keys are lifted to the even-Y point; the
    //    shared x-coordinate is the same for either lift.
    let peer = match peer_public_key.len() {
        32 => {
            let mut sec1 = [0u8; 33];
            sec1[0] = 0x02;
            sec1[1..].copy_from_slice(peer_public_key);
            PublicKey::from_sec1_bytes(&sec1)
        }
        33 | 65 => PublicKey::from_sec1_bytes(peer_public_key),
        other => {
            return Err(anyhow!(
                "Invalid peer public key size: expected 32, 33 or 65 bytes, got {}",
                other
            ))
        }
    }
    .map_err(|e| anyhow!("Invalid peer public key point: {}", e))?;

    // 3. shared_point = peer * secret, keep the x-coordinate only
    let shared_secret = k256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());

    // 4. HKDF-extract into the conversation key
    let (prk, _) = Hkdf::<Sha256>::extract(Some(CONVERSATION_KEY_SALT), shared_secret.raw_secret_bytes());
    let mut conversation_key = [0u8; 32];
    conversation_key.copy_from_slice(&prk);

    Ok(conversation_key)
}
