// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Building and opening gift wraps with a local key

use rand::Rng;
use tracing::debug;

use super::{GiftWrapError, UnwrapStage, Unwrapped, MAX_TIMESTAMP_TWEAK};
use crate::crypto::{decrypt_from, encrypt_to};
use crate::event::{kind, unix_now, Event, UnsignedEvent};
use crate::keys::{Keys, PublicKey};
use crate::secrets::{Identifier, IdentifierError, SecretBundle};

/// `now` pushed back by a uniform random offset in `[0, MAX_TIMESTAMP_TWEAK]`
pub(crate) fn random_past_timestamp(now: u64) -> u64 {
    let offset = rand::thread_rng().gen_range(0..=MAX_TIMESTAMP_TWEAK);
    now.saturating_sub(offset)
}

pub(crate) fn check_d_tag(d_tag: &str) -> Result<(), GiftWrapError> {
    if Identifier::parse(d_tag).is_none() {
        return Err(IdentifierError::Malformed {
            reason: format!("'{}' is not <projectId>|<environment>", d_tag),
        }
        .into());
    }
    Ok(())
}

pub(crate) fn build_rumor(
    bundle: &SecretBundle,
    author: &PublicKey,
    d_tag: &str,
    created_at: u64,
) -> Result<UnsignedEvent, GiftWrapError> {
    let rumor = UnsignedEvent::new(
        author,
        created_at,
        kind::SECRET_BUNDLE,
        vec![vec!["d".to_string(), d_tag.to_string()]],
        bundle.to_json()?,
    );
    Ok(rumor.with_id())
}

/// Encrypt a signed seal to `recipient` under a fresh one-time key
pub(crate) fn seal_in_gift_wrap(seal: &Event, recipient: &PublicKey) -> Result<Event, GiftWrapError> {
    let ephemeral = Keys::generate();
    let content = encrypt_to(&ephemeral, recipient, &seal.to_json()?)?;

    let gift_wrap = UnsignedEvent::new(
        &ephemeral.public_key(),
        random_past_timestamp(unix_now()),
        kind::GIFT_WRAP,
        vec![vec!["p".to_string(), recipient.to_hex()]],
        content,
    )
    .sign(&ephemeral)?;
    Ok(gift_wrap)
}

/// Wrap `bundle` for ourselves with the rumor stamped at the current time
pub fn wrap(bundle: &SecretBundle, keys: &Keys, d_tag: &str) -> Result<Event, GiftWrapError> {
    wrap_at(bundle, keys, d_tag, unix_now())
}

/// Wrap `bundle` with an explicit rumor timestamp
pub fn wrap_at(bundle: &SecretBundle, keys: &Keys, d_tag: &str, created_at: u64) -> Result<Event, GiftWrapError> {
    check_d_tag(d_tag)?;
    let me = keys.public_key();

    let rumor = build_rumor(bundle, &me, d_tag, created_at)?;
    let sealed_rumor = encrypt_to(keys, &me, &serde_json::to_string(&rumor)?)?;
    let seal = UnsignedEvent::new(
        &me,
        random_past_timestamp(unix_now()),
        kind::SEAL,
        Vec::new(),
        sealed_rumor,
    )
    .sign(keys)?;

    let gift_wrap = seal_in_gift_wrap(&seal, &me)?;
    debug!("Wrapped {} secrets for {} as {}", bundle.len(), d_tag, gift_wrap.id);
    Ok(gift_wrap)
}

/// Empty bundle wrapped like any other; wins resolution by timestamp
pub fn create_tombstone(keys: &Keys, d_tag: &str) -> Result<Event, GiftWrapError> {
    wrap(&SecretBundle::new(), keys, d_tag)
}

/// Check the outer event and return its (one-time) signer
pub(crate) fn open_envelope(event: &Event) -> Result<PublicKey, GiftWrapError> {
    if event.kind != kind::GIFT_WRAP {
        return Err(GiftWrapError::unwrap_failed(
            UnwrapStage::OuterEnvelope,
            format!("expected kind {}, got {}", kind::GIFT_WRAP, event.kind),
        ));
    }
    event
        .verify()
        .map_err(|e| GiftWrapError::unwrap_failed(UnwrapStage::OuterEnvelope, e))?;
    event
        .author()
        .map_err(|e| GiftWrapError::unwrap_failed(UnwrapStage::OuterEnvelope, e))
}

/// Parse and authenticate a decrypted seal, returning it with its author
pub(crate) fn open_seal(seal_json: &str) -> Result<(Event, PublicKey), GiftWrapError> {
    let seal = Event::from_json(seal_json)
        .map_err(|e| GiftWrapError::unwrap_failed(UnwrapStage::SealParse, e))?;
    if seal.kind != kind::SEAL {
        return Err(GiftWrapError::unwrap_failed(
            UnwrapStage::SealParse,
            format!("expected kind {}, got {}", kind::SEAL, seal.kind),
        ));
    }
    seal.verify()
        .map_err(|e| GiftWrapError::unwrap_failed(UnwrapStage::SealSignature, e))?;
    let author = seal
        .author()
        .map_err(|e| GiftWrapError::unwrap_failed(UnwrapStage::SealSignature, e))?;
    Ok((seal, author))
}

/// Parse the decrypted rumor and extract the bundle
pub(crate) fn open_rumor(
    wrap: &Event,
    seal_author: PublicKey,
    rumor_json: &str,
) -> Result<Unwrapped, GiftWrapError> {
    let rumor: UnsignedEvent = serde_json::from_str(rumor_json)
        .map_err(|e| GiftWrapError::unwrap_failed(UnwrapStage::RumorParse, e))?;

    if !rumor.id_matches() {
        return Err(GiftWrapError::unwrap_failed(
            UnwrapStage::RumorParse,
            "rumor id does not match its contents",
        ));
    }
    // A seal may only vouch for a rumor written by its own signer.
    if rumor.pubkey != seal_author.to_hex() {
        return Err(GiftWrapError::unwrap_failed(
            UnwrapStage::RumorParse,
            "rumor author differs from seal signer",
        ));
    }
    if rumor.kind != kind::SECRET_BUNDLE {
        return Err(GiftWrapError::unwrap_failed(
            UnwrapStage::RumorParse,
            format!("expected kind {}, got {}", kind::SECRET_BUNDLE, rumor.kind),
        ));
    }

    let d_tag = rumor
        .tag_value("d")
        .ok_or_else(|| GiftWrapError::unwrap_failed(UnwrapStage::Identifier, "missing d tag"))?
        .to_string();

    let bundle = SecretBundle::from_json(&rumor.content)
        .map_err(|e| GiftWrapError::unwrap_failed(UnwrapStage::Bundle, e))?;

    Ok(Unwrapped {
        bundle,
        d_tag,
        created_at: rumor.created_at,
        author: seal_author,
        wrap_id: wrap.id.clone(),
    })
}

/// Open a gift wrap addressed to `keys`. Any failing step fails the whole unwrap.
pub fn unwrap(event: &Event, keys: &Keys) -> Result<Unwrapped, GiftWrapError> {
    let wrap_author = open_envelope(event)?;
    let seal_json = decrypt_from(keys, &wrap_author, &event.content)
        .map_err(|e| GiftWrapError::unwrap_failed(UnwrapStage::OuterDecrypt, e))?;

    let (seal, seal_author) = open_seal(&seal_json)?;
    let rumor_json = decrypt_from(keys, &seal_author, &seal.content)
        .map_err(|e| GiftWrapError::unwrap_failed(UnwrapStage::InnerDecrypt, e))?;

    open_rumor(event, seal_author, &rumor_json)
}
