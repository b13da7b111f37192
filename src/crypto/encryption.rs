// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Versioned payload encryption (ChaCha20 + HMAC-SHA256)
//!
//! Every message gets a fresh 32-byte random nonce. The conversation key is
//! expanded with HKDF (info = nonce) into a ChaCha20 key, a ChaCha20 nonce and
//! an HMAC key. The plaintext is length-prefixed and padded before
//! encryption so ciphertext length leaks only a size bucket. The MAC covers
//! `nonce || ciphertext` and is checked before anything is decrypted.
//!
//! Payload layout (base64):
//!
//! ```text
//! version (1) | nonce (32) | ciphertext (34..=65538) | mac (32)
//! ```

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

use super::error::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Payload format version byte
pub const VERSION: u8 = 2;

const MIN_PLAINTEXT_SIZE: usize = 1;
const MAX_PLAINTEXT_SIZE: usize = 65535;
const MIN_PAYLOAD_B64_LEN: usize = 132;
const MAX_PAYLOAD_B64_LEN: usize = 87472;
const MIN_PAYLOAD_LEN: usize = 99;
const MAX_PAYLOAD_LEN: usize = 65603;

struct MessageKeys {
    chacha_key: [u8; 32],
    chacha_nonce: [u8; 12],
    hmac_key: [u8; 32],
}

fn message_keys(conversation_key: &[u8; 32], nonce: &[u8; 32]) -> Result<MessageKeys, CryptoError> {
    let hkdf = Hkdf::<Sha256>::from_prk(conversation_key).map_err(|e| {
        CryptoError::KeyDerivationFailed {
            operation: "message_keys".to_string(),
            reason: e.to_string(),
        }
    })?;

    let mut okm = [0u8; 76];
    hkdf.expand(nonce, &mut okm)
        .map_err(|e| CryptoError::KeyDerivationFailed {
            operation: "message_keys".to_string(),
            reason: e.to_string(),
        })?;

    let mut keys = MessageKeys {
        chacha_key: [0u8; 32],
        chacha_nonce: [0u8; 12],
        hmac_key: [0u8; 32],
    };
    keys.chacha_key.copy_from_slice(&okm[0..32]);
    keys.chacha_nonce.copy_from_slice(&okm[32..44]);
    keys.hmac_key.copy_from_slice(&okm[44..76]);
    Ok(keys)
}

/// Padded length for a plaintext of `unpadded_len` bytes
///
/// 32-byte minimum; above that, chunks of 32 bytes up to 256, then chunks of
/// one eighth of the next power of two.
pub fn calc_padded_len(unpadded_len: usize) -> usize {
    if unpadded_len <= 32 {
        return 32;
    }
    let next_power = 1usize << (usize::BITS - (unpadded_len - 1).leading_zeros());
    let chunk = if next_power <= 256 { 32 } else { next_power / 8 };
    chunk * (((unpadded_len - 1) / chunk) + 1)
}

fn pad(plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let len = plaintext.len();
    if !(MIN_PLAINTEXT_SIZE..=MAX_PLAINTEXT_SIZE).contains(&len) {
        return Err(CryptoError::EncryptionFailed {
            operation: "pad".to_string(),
            reason: format!(
                "plaintext must be {}..={} bytes, got {}",
                MIN_PLAINTEXT_SIZE, MAX_PLAINTEXT_SIZE, len
            ),
        });
    }

    let padded_len = calc_padded_len(len);
    let mut padded = Vec::with_capacity(2 + padded_len);
    padded.extend_from_slice(&(len as u16).to_be_bytes());
    padded.extend_from_slice(plaintext);
    padded.resize(2 + padded_len, 0);
    Ok(padded)
}

fn unpad(padded: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if padded.len() < 2 {
        return Err(CryptoError::decryption("padding too short"));
    }
    let len = u16::from_be_bytes([padded[0], padded[1]]) as usize;
    if len < MIN_PLAINTEXT_SIZE
        || 2 + len > padded.len()
        || padded.len() != 2 + calc_padded_len(len)
    {
        return Err(CryptoError::decryption("invalid padding"));
    }
    Ok(padded[2..2 + len].to_vec())
}

fn compute_mac(hmac_key: &[u8; 32], nonce: &[u8], ciphertext: &[u8]) -> Result<HmacSha256, CryptoError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(hmac_key)
        .map_err(|e| CryptoError::Other(format!("hmac init: {}", e)))?;
    mac.update(nonce);
    mac.update(ciphertext);
    Ok(mac)
}

fn apply_keystream(keys: &MessageKeys, buffer: &mut [u8]) -> Result<(), CryptoError> {
    let mut cipher = ChaCha20::new_from_slices(&keys.chacha_key, &keys.chacha_nonce)
        .map_err(|e| CryptoError::Other(format!("chacha20 init: {}", e)))?;
    cipher.apply_keystream(buffer);
    Ok(())
}

/// Encrypt `plaintext` under a conversation key with a fresh random nonce
///
/// Encrypting the same plaintext twice yields different payloads.
pub fn encrypt(conversation_key: &[u8; 32], plaintext: &str) -> Result<String, CryptoError> {
    let mut nonce = [0u8; 32];
    OsRng.fill_bytes(&mut nonce);
    encrypt_with_nonce(conversation_key, plaintext, &nonce)
}

/// Encrypt with a caller-supplied nonce
///
/// # Security
///
/// **CRITICAL**: Never reuse a nonce with the same conversation key. Use
/// [`encrypt`] unless reproducing a known vector.
pub fn encrypt_with_nonce(
    conversation_key: &[u8; 32],
    plaintext: &str,
    nonce: &[u8; 32],
) -> Result<String, CryptoError> {
    let keys = message_keys(conversation_key, nonce)?;

    let mut ciphertext = pad(plaintext.as_bytes())?;
    apply_keystream(&keys, &mut ciphertext)?;

    let mac = compute_mac(&keys.hmac_key, nonce, &ciphertext)?.finalize().into_bytes();

    let mut payload = Vec::with_capacity(1 + 32 + ciphertext.len() + 32);
    payload.push(VERSION);
    payload.extend_from_slice(nonce);
    payload.extend_from_slice(&ciphertext);
    payload.extend_from_slice(&mac);

    Ok(BASE64.encode(payload))
}

/// Authenticate and decrypt a payload produced by [`encrypt`]
///
/// # Errors
///
/// Fails closed with `DecryptionFailed` or `InvalidPayload` when the payload is
/// truncated, has an unknown version, fails MAC verification (wrong key or
/// tampering) or carries inconsistent padding.
pub fn decrypt(conversation_key: &[u8; 32], payload: &str) -> Result<String, CryptoError> {
    if payload.is_empty() || payload.starts_with('#') {
        return Err(CryptoError::InvalidPayload {
            field: "version".to_string(),
            reason: "unknown or unsupported encryption version".to_string(),
        });
    }
    if !(MIN_PAYLOAD_B64_LEN..=MAX_PAYLOAD_B64_LEN).contains(&payload.len()) {
        return Err(CryptoError::InvalidPayload {
            field: "payload".to_string(),
            reason: format!("invalid payload length {}", payload.len()),
        });
    }

    let data = BASE64.decode(payload).map_err(|e| CryptoError::InvalidPayload {
        field: "payload".to_string(),
        reason: format!("base64 decode error: {}", e),
    })?;
    if !(MIN_PAYLOAD_LEN..=MAX_PAYLOAD_LEN).contains(&data.len()) {
        return Err(CryptoError::InvalidPayload {
            field: "payload".to_string(),
            reason: format!("invalid data length {}", data.len()),
        });
    }
    if data[0] != VERSION {
        return Err(CryptoError::InvalidPayload {
            field: "version".to_string(),
            reason: format!("unsupported version {}", data[0]),
        });
    }

    let mut nonce = [0u8; 32];
    nonce.copy_from_slice(&data[1..33]);
    let (ciphertext, mac) = data[33..].split_at(data.len() - 33 - 32);

    let keys = message_keys(conversation_key, &nonce)?;
    compute_mac(&keys.hmac_key, &nonce, ciphertext)?
        .verify_slice(mac)
        .map_err(|_| CryptoError::decryption("invalid MAC"))?;

    let mut padded = ciphertext.to_vec();
    apply_keystream(&keys, &mut padded)?;
    let plaintext = unpad(&padded)?;

    String::from_utf8(plaintext).map_err(|e| CryptoError::decryption(format!("plaintext is not UTF-8: {}", e)))
}
