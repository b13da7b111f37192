// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Advisory deletion requests

use redshift::event::kind;
use redshift::giftwrap::deletion::deletion_targets;
use redshift::{create_deletion_request, wrap, Keys, SecretBundle};

#[test]
fn test_deletion_request_targets_wraps() {
    let keys = Keys::generate();
    let bundle = SecretBundle::from_pairs([("A", "1")]).unwrap();
    let first = wrap(&bundle, &keys, "app|prod").unwrap();
    let second = wrap(&bundle, &keys, "app|prod").unwrap();

    let ids = vec![first.id.clone(), second.id.clone()];
    let request = create_deletion_request(&ids, &keys, Some("rotated")).unwrap();

    assert_eq!(request.kind, kind::DELETION);
    assert_eq!(request.pubkey, keys.public_key().to_hex());
    assert_eq!(request.content, "rotated");
    assert!(request.verify().is_ok());
    assert_eq!(deletion_targets(&request), ids);
    assert!(request
        .tags
        .iter()
        .any(|tag| tag.len() == 2 && tag[0] == "k" && tag[1] == kind::GIFT_WRAP.to_string()));
}

#[test]
fn test_deletion_request_validates_ids() {
    let keys = Keys::generate();
    assert!(create_deletion_request(&[], &keys, None).is_err());
    assert!(create_deletion_request(&["not-an-id".to_string()], &keys, None).is_err());
}
