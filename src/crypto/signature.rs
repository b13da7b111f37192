// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BIP-340 Schnorr signatures over event ids
//!
//! Events are signed over their 32-byte id (itself a SHA-256 digest), so the
//! id is passed to the signer as a prehash.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::schnorr::Signature;

use super::error::CryptoError;
use crate::keys::{Keys, PublicKey};

/// Sign a 32-byte event id, returning the 64-byte signature
pub fn sign_id(keys: &Keys, id: &[u8; 32]) -> Result<[u8; 64], CryptoError> {
    let signature: Signature = keys
        .signing_key()
        .sign_prehash(id)
        .map_err(|e| CryptoError::InvalidSignature {
            operation: "sign_id".to_string(),
            reason: e.to_string(),
        })?;
    Ok(signature.to_bytes())
}

/// Verify a signature over a 32-byte event id
///
/// # Errors
///
/// Returns `InvalidSignature` if the signature is not 64 bytes, is not a
/// valid encoding, or does not verify under `public_key`.
pub fn verify_id(public_key: &PublicKey, id: &[u8; 32], signature: &[u8]) -> Result<(), CryptoError> {
    if signature.len() != 64 {
        return Err(CryptoError::InvalidSignature {
            operation: "verify_id".to_string(),
            reason: format!("expected 64 bytes, got {}", signature.len()),
        });
    }

    let signature = Signature::try_from(signature).map_err(|e| CryptoError::InvalidSignature {
        operation: "verify_id".to_string(),
        reason: format!("malformed signature: {}", e),
    })?;

    let verifying_key = public_key
        .verifying_key()
        .map_err(|e| CryptoError::InvalidKey {
            key_type: "public_key".to_string(),
            reason: e.to_string(),
        })?;

    verifying_key
        .verify_prehash(id, &signature)
        .map_err(|_| CryptoError::InvalidSignature {
            operation: "verify_id".to_string(),
            reason: "signature does not match".to_string(),
        })
}
