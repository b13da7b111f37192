// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Identifier construction and parsing

use redshift::{make_identifier, parse_identifier, Identifier, IdentifierError};

#[test]
fn test_make_then_parse_roundtrips() {
    for (project, env) in [("p1", "production"), ("7f3a-uuid", "dev"), ("a b", "c.d")] {
        let d_tag = make_identifier(project, env).unwrap();
        assert_eq!(parse_identifier(&d_tag), Some((project.to_string(), env.to_string())));
    }
}

#[test]
fn test_make_rejects_bad_components() {
    for (project, env) in [("", "prod"), ("proj", ""), ("a|b", "prod"), ("proj", "x|y")] {
        assert!(matches!(
            make_identifier(project, env),
            Err(IdentifierError::Malformed { .. })
        ));
    }
}

#[test]
fn test_parse_never_panics_on_garbage() {
    for d_tag in ["", "|", "a|", "|b", "a|b|c", "noseparator", "||", "\u{0}|\u{0}|"] {
        assert_eq!(parse_identifier(d_tag), None, "{:?} should not parse", d_tag);
    }
}

#[test]
fn test_from_str_and_display_agree() {
    let identifier: Identifier = "billing|staging".parse().unwrap();
    assert_eq!(identifier.project_id, "billing");
    assert_eq!(identifier.environment, "staging");
    assert_eq!(identifier.to_string(), "billing|staging");
    assert!("billing".parse::<Identifier>().is_err());
}
