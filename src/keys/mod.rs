// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Identity keys and the bech32 key codec
//!
//! - **codec**: `npub` / `nsec` bech32 encoding with checksum verification
//! - **identity**: `Keys` (secret + public) and x-only `PublicKey`
//! - **env**: loading the caller's identity from `REDSHIFT_NSEC`

pub mod codec;
pub mod env;
pub mod error;
pub mod identity;

pub use codec::{decode, encode, KeyKind};
pub use env::extract_private_key_from_env;
pub use error::KeyError;
pub use identity::{Keys, PublicKey};
