// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Secret Store Façade
//!
//! The API consumed by CLI and web layers. A `SecretStore` owns one identity
//! and, after [`SecretStore::connect`], one relay set. No network I/O happens
//! until a fetch or publish is issued.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

pub mod error;

pub use error::{Result, StoreError};

use crate::config::StoreConfig;
use crate::event::{kind, unix_now, Event, Filter};
use crate::giftwrap::{
    create_deletion_request_with_signer, unwrap_with_signer, wrap_with_signer, GiftWrapError, Signer, UnwrapStage,
    Unwrapped,
};
use crate::keys::{extract_private_key_from_env, Keys, PublicKey};
use crate::relay::{PublishOutcome, Relay, RelayPool, Subscription};
use crate::secrets::{merge_secrets, Identifier, ResolvedState, Resolver, SecretBundle};
use crate::version;

pub struct SecretStore {
    signer: Arc<dyn Signer>,
    config: StoreConfig,
    pool: Option<RelayPool>,
}

impl SecretStore {
    pub fn new(keys: Keys, config: StoreConfig) -> Self {
        Self::with_signer(Arc::new(keys), config)
    }

    /// Store backed by an external signer (non-extractable keys)
    pub fn with_signer(signer: Arc<dyn Signer>, config: StoreConfig) -> Self {
        debug!(
            "{} store for {}",
            version::get_version_string(),
            signer.public_key()
        );
        Self {
            signer,
            config,
            pool: None,
        }
    }

    /// Identity from `REDSHIFT_NSEC`, configuration and relays from the environment
    pub fn from_env() -> Result<Self> {
        let keys = extract_private_key_from_env().map_err(|e| StoreError::Config(e.to_string()))?;
        let config = StoreConfig::from_env();
        config.validate().map_err(StoreError::Config)?;
        let relays = config.relays.clone();

        let mut store = Self::new(keys, config);
        store.connect(relays.as_slice())?;
        Ok(store)
    }

    pub fn public_key(&self) -> PublicKey {
        self.signer.public_key()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Record the relay set for later calls; URLs are validated, nothing is contacted
    pub fn connect<S: AsRef<str>>(&mut self, relays: &[S]) -> Result<()> {
        let pool = RelayPool::from_urls(relays, self.config.pool_options())?;
        info!("Connected to {} relays", pool.len());
        self.pool = Some(pool);
        Ok(())
    }

    /// Use pre-built relays (in-memory relays, custom transports)
    pub fn connect_relays(&mut self, relays: Vec<Arc<dyn Relay>>) {
        self.pool = Some(RelayPool::new(relays, self.config.pool_options()));
    }

    pub fn relays(&self) -> Vec<String> {
        self.pool.as_ref().map(RelayPool::relay_urls).unwrap_or_default()
    }

    fn pool(&self) -> Result<&RelayPool> {
        match &self.pool {
            Some(pool) if !pool.is_empty() => Ok(pool),
            _ => Err(StoreError::NoRelaysConfigured),
        }
    }

    fn own_wraps_filter(&self) -> Filter {
        Filter::new()
            .kind(kind::GIFT_WRAP)
            .pubkey_tag(&self.signer.public_key())
    }

    /// Open a query for every gift wrap addressed to us
    ///
    /// Callers that want to stop early can fold events through [`SecretStore::unwrap_event`]
    /// and a [`Resolver`] and close the subscription at any point.
    pub async fn subscribe(&self) -> Result<Subscription> {
        Ok(self.pool()?.query(self.own_wraps_filter()).await?)
    }

    /// Unwrap one gift wrap and check it was authored by us
    pub async fn unwrap_event(&self, event: &Event) -> Result<Unwrapped> {
        let candidate = unwrap_with_signer(event, self.signer.as_ref()).await?;
        if candidate.author != self.signer.public_key() {
            return Err(GiftWrapError::unwrap_failed(
                UnwrapStage::SealSignature,
                format!("sealed by foreign identity {}", candidate.author),
            )
            .into());
        }
        Ok(candidate)
    }

    async fn resolver(&self) -> Result<Resolver> {
        let events = self.pool()?.fetch_events(self.own_wraps_filter()).await?;
        let mut resolver = Resolver::new();
        let mut excluded = 0usize;

        for event in &events {
            match self.unwrap_event(event).await {
                Ok(candidate) => {
                    resolver.observe(candidate);
                }
                Err(e) => {
                    excluded += 1;
                    warn!("Excluding gift wrap {}: {}", event.id, e);
                }
            }
        }

        debug!(
            "Resolved {} identifiers from {} events ({} excluded, {} malformed identifiers)",
            resolver.len(),
            events.len(),
            excluded,
            resolver.rejected()
        );
        Ok(resolver)
    }

    /// Resolved state of every identifier we have written to
    pub async fn resolve_all(&self) -> Result<BTreeMap<Identifier, ResolvedState>> {
        Ok(self.resolver().await?.into_states())
    }

    /// Winning state for one identifier, including timestamps and superseded wraps
    pub async fn fetch_state(&self, project_id: &str, environment: &str) -> Result<Option<ResolvedState>> {
        let identifier = Identifier::new(project_id, environment)?;
        Ok(self.resolver().await?.get(&identifier).cloned())
    }

    /// Current bundle for a project environment; `None` if nothing was ever published
    pub async fn fetch_secrets(&self, project_id: &str, environment: &str) -> Result<Option<SecretBundle>> {
        Ok(self
            .fetch_state(project_id, environment)
            .await?
            .map(|state| state.bundle))
    }

    /// Distinct project ids, sorted
    pub async fn list_projects(&self) -> Result<Vec<String>> {
        let projects: BTreeSet<String> = self
            .resolve_all()
            .await?
            .into_keys()
            .map(|id| id.project_id)
            .collect();
        Ok(projects.into_iter().collect())
    }

    /// Distinct environments of one project, sorted
    pub async fn list_environments(&self, project_id: &str) -> Result<Vec<String>> {
        let environments: BTreeSet<String> = self
            .resolve_all()
            .await?
            .into_keys()
            .filter(|id| id.project_id == project_id)
            .map(|id| id.environment)
            .collect();
        Ok(environments.into_iter().collect())
    }

    /// Wrap and publish `bundle` stamped with the current time
    ///
    /// Timestamps have one-second resolution. Two calls within the same second
    /// tie, and the version a reader sees then depends on arrival order. Use
    /// [`SecretStore::upsert_secrets`] when a write must supersede the current
    /// state; it stamps strictly after the version it read.
    pub async fn publish_secrets(
        &self,
        project_id: &str,
        environment: &str,
        bundle: &SecretBundle,
    ) -> Result<PublishOutcome> {
        self.publish_secrets_at(project_id, environment, bundle, unix_now())
            .await
    }

    /// Wrap and publish `bundle` with an explicit logical timestamp
    pub async fn publish_secrets_at(
        &self,
        project_id: &str,
        environment: &str,
        bundle: &SecretBundle,
        created_at: u64,
    ) -> Result<PublishOutcome> {
        let identifier = Identifier::new(project_id, environment)?;
        let pool = self.pool()?;

        let event = wrap_with_signer(bundle, self.signer.as_ref(), &identifier.as_d_tag(), created_at).await?;
        let outcome = pool.publish(&event).await?;
        info!(
            "Published {} secrets for {} as {} ({} relays accepted)",
            bundle.len(),
            identifier,
            event.id,
            outcome.accepted.len()
        );
        Ok(outcome)
    }

    /// Pure shallow merge; `updates` wins on conflicts
    pub fn merge_secrets(existing: &SecretBundle, updates: &SecretBundle) -> SecretBundle {
        merge_secrets(existing, updates)
    }

    /// Rumor timestamp strictly after `previous`, so the new write wins resolution
    fn next_timestamp(previous: Option<&ResolvedState>) -> u64 {
        let now = unix_now();
        match previous {
            Some(state) if state.created_at >= now => state.created_at + 1,
            _ => now,
        }
    }

    /// Fetch, merge `updates` over the current bundle, publish; returns the new bundle
    pub async fn upsert_secrets(
        &self,
        project_id: &str,
        environment: &str,
        updates: &SecretBundle,
    ) -> Result<SecretBundle> {
        let current = self.fetch_state(project_id, environment).await?;
        let existing = current.as_ref().map(|s| s.bundle.clone()).unwrap_or_default();
        let merged = merge_secrets(&existing, updates);

        self.publish_secrets_at(project_id, environment, &merged, Self::next_timestamp(current.as_ref()))
            .await?;
        Ok(merged)
    }

    /// Fetch, drop `keys`, publish; returns the new bundle
    pub async fn remove_secrets<S: AsRef<str>>(
        &self,
        project_id: &str,
        environment: &str,
        keys: &[S],
    ) -> Result<SecretBundle> {
        let current = self.fetch_state(project_id, environment).await?;
        let existing = current.as_ref().map(|s| s.bundle.clone()).unwrap_or_default();
        let remaining = existing.without(keys);

        self.publish_secrets_at(project_id, environment, &remaining, Self::next_timestamp(current.as_ref()))
            .await?;
        Ok(remaining)
    }

    /// Publish a tombstone, then ask relays to erase the superseded wraps
    ///
    /// The deletion request is advisory; its failure is logged, never returned.
    pub async fn delete_environment(&self, project_id: &str, environment: &str) -> Result<PublishOutcome> {
        let current = self.fetch_state(project_id, environment).await?;
        let outcome = self
            .publish_secrets_at(
                project_id,
                environment,
                &SecretBundle::new(),
                Self::next_timestamp(current.as_ref()),
            )
            .await?;

        let Some(state) = current else {
            return Ok(outcome);
        };
        let mut targets = state.superseded;
        targets.push(state.wrap_id);

        match create_deletion_request_with_signer(&targets, self.signer.as_ref(), Some("environment deleted")).await {
            Ok(request) => {
                let advisory = self.pool()?.publish_advisory(&request).await;
                debug!(
                    "Deletion request {} for {} wraps accepted by {} relays",
                    request.id,
                    targets.len(),
                    advisory.accepted.len()
                );
            }
            Err(e) => warn!("Could not build deletion request for {}: {}", state.identifier, e),
        }
        Ok(outcome)
    }
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStore")
            .field("public_key", &self.signer.public_key())
            .field("relays", &self.relays())
            .finish()
    }
}
