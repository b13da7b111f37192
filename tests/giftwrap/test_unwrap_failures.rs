// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Every malformed or foreign gift wrap must fail closed

use redshift::event::kind;
use redshift::{unwrap, wrap, Event, GiftWrapError, Keys, SecretBundle, UnsignedEvent, UnwrapStage};

fn wrapped(keys: &Keys) -> Event {
    let bundle = SecretBundle::from_pairs([("TOKEN", "abc")]).unwrap();
    wrap(&bundle, keys, "app|prod").unwrap()
}

fn stage_of(result: Result<redshift::Unwrapped, GiftWrapError>) -> Option<UnwrapStage> {
    result.unwrap_err().stage()
}

#[test]
fn test_wrong_recipient_rejected() {
    let owner = Keys::generate();
    let stranger = Keys::generate();
    let event = wrapped(&owner);
    assert_eq!(stage_of(unwrap(&event, &stranger)), Some(UnwrapStage::OuterDecrypt));
}

#[test]
fn test_tampered_signature_rejected() {
    let keys = Keys::generate();
    let mut event = wrapped(&keys);
    let mut sig = hex::decode(&event.sig).unwrap();
    sig[0] ^= 0xff;
    event.sig = hex::encode(sig);
    assert_eq!(stage_of(unwrap(&event, &keys)), Some(UnwrapStage::OuterEnvelope));
}

#[test]
fn test_tampered_content_rejected() {
    let keys = Keys::generate();
    let mut event = wrapped(&keys);
    event.content.push('A');
    assert_eq!(stage_of(unwrap(&event, &keys)), Some(UnwrapStage::OuterEnvelope));
}

#[test]
fn test_resigned_tampered_content_rejected() {
    // A forger can re-sign the outer layer but cannot forge the MAC.
    let keys = Keys::generate();
    let event = wrapped(&keys);
    let forger = Keys::generate();

    let mut content = event.content.clone();
    let replacement = if content.ends_with('A') { 'B' } else { 'A' };
    content.pop();
    content.push(replacement);
    let forged = UnsignedEvent::new(
        &forger.public_key(),
        event.created_at,
        kind::GIFT_WRAP,
        event.tags.clone(),
        content,
    )
    .sign(&forger)
    .unwrap();

    assert_eq!(stage_of(unwrap(&forged, &keys)), Some(UnwrapStage::OuterDecrypt));
}

#[test]
fn test_wrong_kind_rejected() {
    let keys = Keys::generate();
    let event = wrapped(&keys);
    let relabelled = UnsignedEvent::new(
        &keys.public_key(),
        event.created_at,
        kind::SEAL,
        event.tags.clone(),
        event.content.clone(),
    )
    .sign(&keys)
    .unwrap();
    assert_eq!(stage_of(unwrap(&relabelled, &keys)), Some(UnwrapStage::OuterEnvelope));
}

#[test]
fn test_missing_fields_rejected_at_parse() {
    let keys = Keys::generate();
    let event = wrapped(&keys);
    let mut value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
    value.as_object_mut().unwrap().remove("sig");
    assert!(Event::from_json(&value.to_string()).is_err());
}

#[test]
fn test_plain_note_never_unwraps() {
    let keys = Keys::generate();
    let note = UnsignedEvent::new(&keys.public_key(), 1, 1, Vec::new(), "hello".to_string())
        .sign(&keys)
        .unwrap();
    assert!(unwrap(&note, &keys).is_err());
}
