// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Redshift secret store

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-gift-wrap-secrets-2026-10-19";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Major version number
pub const VERSION_MAJOR: u32 = 0;

/// Minor version number
pub const VERSION_MINOR: u32 = 1;

/// Patch version number
pub const VERSION_PATCH: u32 = 0;

/// Build date
pub const BUILD_DATE: &str = "2026-10-19";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "gift-wrap",
    "sealed-rumors",
    "randomized-timestamps",
    "bech32-keys",
    "secp256k1-ecdh",
    "chacha20-hmac-sha256",
    "schnorr-signatures",
    "signer-delegation",
    "last-write-wins",
    "tombstones",
    "advisory-deletion",
    "publish-retry",
    "rate-limiting",
];

/// Event kinds this version reads and writes
pub const SUPPORTED_KINDS: &[u16] = &[
    crate::event::kind::DELETION,
    crate::event::kind::SEAL,
    crate::event::kind::GIFT_WRAP,
    crate::event::kind::SECRET_BUNDLE,
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Redshift {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info as JSON
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
        "kinds": SUPPORTED_KINDS,
    })
}
