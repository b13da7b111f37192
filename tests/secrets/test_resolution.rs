// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Resolution over real unwrapped gift wraps

use redshift::{resolve, unwrap, wrap_at, Identifier, Keys, Resolver, SecretBundle, Unwrapped};

fn candidate(keys: &Keys, d_tag: &str, created_at: u64, value: &str) -> Unwrapped {
    let bundle = SecretBundle::from_pairs([("VALUE", value)]).unwrap();
    let event = wrap_at(&bundle, keys, d_tag, created_at).unwrap();
    unwrap(&event, keys).unwrap()
}

fn value_of(states: &std::collections::BTreeMap<Identifier, redshift::ResolvedState>, d_tag: &str) -> String {
    let identifier: Identifier = d_tag.parse().unwrap();
    states[&identifier].bundle.get("VALUE").unwrap().as_str().unwrap().to_string()
}

#[test]
fn test_latest_rumor_wins_in_every_arrival_order() {
    let keys = Keys::generate();
    let a = candidate(&keys, "app|prod", 100, "old");
    let b = candidate(&keys, "app|prod", 300, "newest");
    let c = candidate(&keys, "app|prod", 200, "middle");

    let orders = [
        [&a, &b, &c],
        [&a, &c, &b],
        [&b, &a, &c],
        [&b, &c, &a],
        [&c, &a, &b],
        [&c, &b, &a],
    ];
    for order in orders {
        let states = resolve(order.into_iter().cloned());
        assert_eq!(value_of(&states, "app|prod"), "newest");
        let identifier: Identifier = "app|prod".parse().unwrap();
        assert_eq!(states[&identifier].candidates, 3);
        assert_eq!(states[&identifier].superseded.len(), 2);
        assert_eq!(states[&identifier].wrap_id, b.wrap_id);
    }
}

#[test]
fn test_identifiers_resolve_independently() {
    let keys = Keys::generate();
    let states = resolve(vec![
        candidate(&keys, "app|prod", 10, "prod-1"),
        candidate(&keys, "app|staging", 50, "staging-1"),
        candidate(&keys, "app|prod", 20, "prod-2"),
        candidate(&keys, "other|prod", 5, "other"),
    ]);

    assert_eq!(states.len(), 3);
    assert_eq!(value_of(&states, "app|prod"), "prod-2");
    assert_eq!(value_of(&states, "app|staging"), "staging-1");
    assert_eq!(value_of(&states, "other|prod"), "other");
}

#[test]
fn test_equal_timestamps_keep_first_seen() {
    let keys = Keys::generate();
    let first = candidate(&keys, "app|prod", 500, "first");
    let second = candidate(&keys, "app|prod", 500, "second");

    let forward = resolve(vec![first.clone(), second.clone()]);
    let backward = resolve(vec![second, first]);
    assert_eq!(value_of(&forward, "app|prod"), "first");
    assert_eq!(value_of(&backward, "app|prod"), "second");
}

#[test]
fn test_tombstone_with_later_timestamp_wins() {
    let keys = Keys::generate();
    let live = candidate(&keys, "app|prod", 100, "live");
    let tombstone = unwrap(&wrap_at(&SecretBundle::new(), &keys, "app|prod", 200).unwrap(), &keys).unwrap();

    for order in [vec![live.clone(), tombstone.clone()], vec![tombstone, live]] {
        let states = resolve(order);
        let identifier: Identifier = "app|prod".parse().unwrap();
        assert!(states[&identifier].is_tombstone());
    }
}

#[test]
fn test_duplicate_wraps_from_many_relays_count_once() {
    let keys = Keys::generate();
    let only = candidate(&keys, "app|prod", 100, "v");

    let mut resolver = Resolver::new();
    assert!(resolver.observe(only.clone()));
    assert!(!resolver.observe(only.clone()));
    assert!(!resolver.observe(only));

    let identifier: Identifier = "app|prod".parse().unwrap();
    let state = resolver.get(&identifier).unwrap();
    assert_eq!(state.candidates, 1);
    assert!(state.superseded.is_empty());
}

#[test]
fn test_malformed_identifier_is_counted_not_resolved() {
    let keys = Keys::generate();
    let mut bad = candidate(&keys, "app|prod", 100, "v");
    bad.d_tag = "a|b|c".to_string();

    let mut resolver = Resolver::new();
    assert!(!resolver.observe(bad));
    assert!(resolver.is_empty());
    assert_eq!(resolver.rejected(), 1);
}

#[test]
fn test_snapshot_is_available_mid_stream() {
    let keys = Keys::generate();
    let mut resolver = Resolver::new();
    resolver.observe(candidate(&keys, "app|prod", 1, "one"));
    let early = resolver.snapshot();
    resolver.observe(candidate(&keys, "app|prod", 2, "two"));

    assert_eq!(value_of(&early, "app|prod"), "one");
    assert_eq!(value_of(&resolver.snapshot(), "app|prod"), "two");
}
