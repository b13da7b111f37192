// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Identity loading from the environment
//!
//! ## Security Considerations
//!
//! - The secret is read from the `REDSHIFT_NSEC` environment variable
//! - Accepted forms: `nsec1…` or 64 hex characters (optional `0x` prefix)
//! - The secret is NEVER logged; only the derived public key is

use anyhow::{anyhow, Result};
use std::env;
use tracing::info;

use super::identity::Keys;

/// Environment variable holding the caller's secret key
pub const SECRET_KEY_ENV: &str = "REDSHIFT_NSEC";

/// Load the caller's identity from `REDSHIFT_NSEC`
///
/// # Errors
///
/// - `REDSHIFT_NSEC` not set or empty
/// - Value is neither a valid nsec nor a valid 32-byte hex secret
pub fn extract_private_key_from_env() -> Result<Keys> {
    let raw = env::var(SECRET_KEY_ENV)
        .map_err(|_| anyhow!("{} environment variable not set", SECRET_KEY_ENV))?;

    let raw = raw.trim();
    if raw.is_empty() {
        return Err(anyhow!("{} is empty", SECRET_KEY_ENV));
    }

    let keys = Keys::parse(raw).map_err(|e| anyhow!("{} is invalid: {}", SECRET_KEY_ENV, e))?;

    info!(
        "Identity loaded from {} (public key {})",
        SECRET_KEY_ENV,
        keys.public_key()
    );

    Ok(keys)
}
