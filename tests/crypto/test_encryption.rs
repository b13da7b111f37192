// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Point-to-point encryption between identities

use base64::{engine::general_purpose::STANDARD, Engine as _};
use redshift::crypto::{decrypt_from, encrypt_to, CryptoError};
use redshift::Keys;

#[test]
fn test_same_plaintext_encrypts_differently() {
    let alice = Keys::generate();
    let bob = Keys::generate();

    let first = encrypt_to(&alice, &bob.public_key(), "same message").unwrap();
    let second = encrypt_to(&alice, &bob.public_key(), "same message").unwrap();
    assert_ne!(first, second);

    assert_eq!(decrypt_from(&bob, &alice.public_key(), &first).unwrap(), "same message");
    assert_eq!(decrypt_from(&bob, &alice.public_key(), &second).unwrap(), "same message");
}

#[test]
fn test_both_directions_share_a_key() {
    let alice = Keys::generate();
    let bob = Keys::generate();

    let to_bob = encrypt_to(&alice, &bob.public_key(), "ping").unwrap();
    let to_alice = encrypt_to(&bob, &alice.public_key(), "pong").unwrap();

    assert_eq!(decrypt_from(&bob, &alice.public_key(), &to_bob).unwrap(), "ping");
    assert_eq!(decrypt_from(&alice, &bob.public_key(), &to_alice).unwrap(), "pong");
}

#[test]
fn test_self_encryption() {
    let me = Keys::generate();
    let payload = encrypt_to(&me, &me.public_key(), "{\"API_KEY\":\"x\"}").unwrap();
    assert_eq!(
        decrypt_from(&me, &me.public_key(), &payload).unwrap(),
        "{\"API_KEY\":\"x\"}"
    );
}

#[test]
fn test_wrong_key_fails_closed() {
    let alice = Keys::generate();
    let bob = Keys::generate();
    let mallory = Keys::generate();

    let payload = encrypt_to(&alice, &bob.public_key(), "secret").unwrap();
    assert!(matches!(
        decrypt_from(&mallory, &alice.public_key(), &payload),
        Err(CryptoError::DecryptionFailed { .. })
    ));
    // Right receiver, wrong claimed sender
    assert!(decrypt_from(&bob, &mallory.public_key(), &payload).is_err());
}

#[test]
fn test_every_tampered_byte_is_detected() {
    let alice = Keys::generate();
    let bob = Keys::generate();
    let payload = encrypt_to(&alice, &bob.public_key(), "tamper me").unwrap();
    let raw = STANDARD.decode(&payload).unwrap();

    for index in 0..raw.len() {
        let mut tampered = raw.clone();
        tampered[index] ^= 0x01;
        let encoded = STANDARD.encode(&tampered);
        assert!(
            decrypt_from(&bob, &alice.public_key(), &encoded).is_err(),
            "flipped byte {} went unnoticed",
            index
        );
    }
}

#[test]
fn test_truncated_payload_rejected() {
    let alice = Keys::generate();
    let bob = Keys::generate();
    let payload = encrypt_to(&alice, &bob.public_key(), "truncate me").unwrap();
    let raw = STANDARD.decode(&payload).unwrap();

    for cut in [1, 16, 32] {
        let truncated = STANDARD.encode(&raw[..raw.len() - cut]);
        assert!(decrypt_from(&bob, &alice.public_key(), &truncated).is_err());
    }
    assert!(decrypt_from(&bob, &alice.public_key(), "").is_err());
    assert!(decrypt_from(&bob, &alice.public_key(), "not base64 at all!").is_err());
}
