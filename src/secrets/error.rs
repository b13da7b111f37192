// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Errors for secret bundles and identifiers

use thiserror::Error;

/// Raised when building an identifier from invalid components
///
/// Parsing never raises this; `parse_identifier` returns `None` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("Malformed identifier: {reason}")]
    Malformed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BundleError {
    /// Secret names must match `[A-Za-z_][A-Za-z0-9_]*`
    #[error("Invalid secret key '{key}'")]
    InvalidKey { key: String },

    #[error("Invalid bundle JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for BundleError {
    fn from(err: serde_json::Error) -> Self {
        BundleError::Json(err.to_string())
    }
}
