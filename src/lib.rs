// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Redshift: a decentralized secret store
//!
//! Secret bundles are encrypted client-side, gift-wrapped and published to
//! untrusted relays. Any holder of the identity key can rebuild the current
//! secret set from any subset of those relays.

pub mod config;
pub mod crypto;
pub mod event;
pub mod giftwrap;
pub mod keys;
pub mod relay;
pub mod secrets;
pub mod store;
pub mod version;

// Re-export main types
pub use config::StoreConfig;
pub use event::{Event, Filter, UnsignedEvent};
pub use giftwrap::{
    create_deletion_request, create_tombstone, unwrap, wrap, wrap_at, GiftWrapError, Signer, UnwrapStage, Unwrapped,
};
pub use keys::{KeyError, KeyKind, Keys, PublicKey};
pub use relay::{MemoryRelay, PublishOutcome, Relay, RelayError, RelayPool, Subscription, WebSocketRelay};
pub use secrets::{
    make_identifier, merge_secrets, parse_identifier, resolve, Identifier, IdentifierError, ResolvedState, Resolver,
    SecretBundle,
};
pub use store::{SecretStore, StoreError};
