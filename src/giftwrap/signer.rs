// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Signer-delegated wrapping
//!
//! For identities whose secret key cannot be extracted (hardware keys, browser
//! extensions, remote signers). The wire shape is identical to [`super::wrap`].

use async_trait::async_trait;

use super::wrap::{build_rumor, check_d_tag, open_envelope, open_rumor, open_seal, random_past_timestamp, seal_in_gift_wrap};
use super::{GiftWrapError, UnwrapStage, Unwrapped};
use crate::crypto::{decrypt_from, encrypt_to};
use crate::event::{kind, unix_now, Event, UnsignedEvent};
use crate::keys::{Keys, PublicKey};
use crate::secrets::SecretBundle;

/// An identity that can sign events and encrypt/decrypt payloads
#[async_trait]
pub trait Signer: Send + Sync {
    fn public_key(&self) -> PublicKey;

    async fn sign_event(&self, event: UnsignedEvent) -> Result<Event, GiftWrapError>;

    async fn encrypt(&self, recipient: &PublicKey, plaintext: &str) -> Result<String, GiftWrapError>;

    async fn decrypt(&self, sender: &PublicKey, payload: &str) -> Result<String, GiftWrapError>;
}

#[async_trait]
impl Signer for Keys {
    fn public_key(&self) -> PublicKey {
        Keys::public_key(self)
    }

    async fn sign_event(&self, event: UnsignedEvent) -> Result<Event, GiftWrapError> {
        Ok(event.sign(self)?)
    }

    async fn encrypt(&self, recipient: &PublicKey, plaintext: &str) -> Result<String, GiftWrapError> {
        Ok(encrypt_to(self, recipient, plaintext)?)
    }

    async fn decrypt(&self, sender: &PublicKey, payload: &str) -> Result<String, GiftWrapError> {
        Ok(decrypt_from(self, sender, payload)?)
    }
}

/// Wrap `bundle` for the signer's own identity
pub async fn wrap_with_signer(
    bundle: &SecretBundle,
    signer: &dyn Signer,
    d_tag: &str,
    created_at: u64,
) -> Result<Event, GiftWrapError> {
    check_d_tag(d_tag)?;
    let me = signer.public_key();

    let rumor = build_rumor(bundle, &me, d_tag, created_at)?;
    let sealed_rumor = signer.encrypt(&me, &serde_json::to_string(&rumor)?).await?;
    let seal = signer
        .sign_event(UnsignedEvent::new(
            &me,
            random_past_timestamp(unix_now()),
            kind::SEAL,
            Vec::new(),
            sealed_rumor,
        ))
        .await?;

    if seal.pubkey != me.to_hex() {
        return Err(GiftWrapError::Signer(
            "signer returned a seal for a different identity".to_string(),
        ));
    }
    seal.verify()
        .map_err(|e| GiftWrapError::Signer(format!("signer returned an invalid seal: {}", e)))?;

    seal_in_gift_wrap(&seal, &me)
}

/// Open a gift wrap using the signer's decrypt capability
pub async fn unwrap_with_signer(event: &Event, signer: &dyn Signer) -> Result<Unwrapped, GiftWrapError> {
    let wrap_author = open_envelope(event)?;
    let seal_json = signer
        .decrypt(&wrap_author, &event.content)
        .await
        .map_err(|e| GiftWrapError::unwrap_failed(UnwrapStage::OuterDecrypt, e))?;

    let (seal, seal_author) = open_seal(&seal_json)?;
    let rumor_json = signer
        .decrypt(&seal_author, &seal.content)
        .await
        .map_err(|e| GiftWrapError::unwrap_failed(UnwrapStage::InnerDecrypt, e))?;

    open_rumor(event, seal_author, &rumor_json)
}
