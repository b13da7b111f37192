// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Secret bundles, the addressing scheme and resolution

pub mod bundle;
pub mod error;
pub mod identifier;
pub mod resolve;

pub use bundle::{is_valid_secret_key, merge_secrets, SecretBundle};
pub use error::{BundleError, IdentifierError};
pub use identifier::{make_identifier, parse_identifier, Identifier};
pub use resolve::{resolve, ResolvedState, Resolver};
