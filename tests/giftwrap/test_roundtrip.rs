// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Wrapping and opening secret bundles end to end

use redshift::event::kind;
use redshift::giftwrap::signer::{unwrap_with_signer, wrap_with_signer};
use redshift::giftwrap::MAX_TIMESTAMP_TWEAK;
use redshift::{create_tombstone, unwrap, wrap, wrap_at, Event, Keys, SecretBundle};
use serde_json::json;

fn sample_bundle() -> SecretBundle {
    SecretBundle::from_pairs([
        ("API_KEY", json!("sk-live-123")),
        ("DB_URL", json!("postgres://db:5432/app")),
        ("RETRIES", json!(3)),
    ])
    .unwrap()
}

#[test]
fn test_roundtrip_preserves_bundle_and_identifier() {
    let keys = Keys::generate();
    let event = wrap_at(&sample_bundle(), &keys, "billing|production", 1_750_000_000).unwrap();

    let opened = unwrap(&event, &keys).unwrap();
    assert_eq!(opened.bundle, sample_bundle());
    assert_eq!(opened.d_tag, "billing|production");
    assert_eq!(opened.created_at, 1_750_000_000);
    assert_eq!(opened.author, keys.public_key());
    assert_eq!(opened.wrap_id, event.id);
}

#[test]
fn test_roundtrip_survives_json_transport() {
    let keys = Keys::generate();
    let event = wrap(&sample_bundle(), &keys, "billing|staging").unwrap();

    let wire = event.to_json().unwrap();
    let received = Event::from_json(&wire).unwrap();
    assert_eq!(received, event);
    assert_eq!(unwrap(&received, &keys).unwrap().bundle, sample_bundle());
}

#[test]
fn test_empty_bundle_roundtrips_as_tombstone() {
    let keys = Keys::generate();
    let event = wrap(&SecretBundle::new(), &keys, "billing|dev").unwrap();
    let opened = unwrap(&event, &keys).unwrap();
    assert!(opened.bundle.is_tombstone());

    let tombstone = create_tombstone(&keys, "billing|dev").unwrap();
    assert!(unwrap(&tombstone, &keys).unwrap().bundle.is_tombstone());
}

#[test]
fn test_same_input_gives_distinct_wraps() {
    let keys = Keys::generate();
    let first = wrap_at(&sample_bundle(), &keys, "billing|production", 42).unwrap();
    let second = wrap_at(&sample_bundle(), &keys, "billing|production", 42).unwrap();

    assert_ne!(first.id, second.id);
    assert_ne!(first.pubkey, second.pubkey);
    assert_ne!(first.content, second.content);
    assert_eq!(unwrap(&first, &keys).unwrap().bundle, unwrap(&second, &keys).unwrap().bundle);
}

#[test]
fn test_outer_event_hides_author_and_content() {
    let keys = Keys::generate();
    let event = wrap(&sample_bundle(), &keys, "billing|production").unwrap();

    assert_eq!(event.kind, kind::GIFT_WRAP);
    assert_ne!(event.pubkey, keys.public_key().to_hex());
    assert_eq!(event.tag_value("p"), Some(keys.public_key().to_hex().as_str()));
    assert!(event.tag_value("d").is_none());
    for needle in ["API_KEY", "billing", "postgres"] {
        assert!(!event.content.contains(needle));
    }
}

#[test]
fn test_outer_timestamp_is_backdated_at_most_two_days() {
    let keys = Keys::generate();
    let now = redshift::event::unix_now();
    for _ in 0..10 {
        let event = wrap(&sample_bundle(), &keys, "billing|production").unwrap();
        assert!(event.created_at <= now + 1);
        assert!(event.created_at + MAX_TIMESTAMP_TWEAK + 1 >= now);
    }
}

#[tokio::test]
async fn test_signer_path_matches_local_path() {
    let keys = Keys::generate();
    let event = wrap_with_signer(&sample_bundle(), &keys, "billing|production", 77)
        .await
        .unwrap();

    let via_signer = unwrap_with_signer(&event, &keys).await.unwrap();
    let via_keys = unwrap(&event, &keys).unwrap();
    assert_eq!(via_signer, via_keys);
    assert_eq!(via_signer.created_at, 77);
}
