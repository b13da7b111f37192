// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fixtures for store tests

use std::sync::Arc;

use redshift::{Keys, MemoryRelay, Relay, SecretBundle, SecretStore, StoreConfig};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn fast_config() -> StoreConfig {
    StoreConfig {
        relays: Vec::new(),
        publish_timeout_ms: 500,
        publish_attempts: 2,
        retry_base_delay_ms: 10,
        query_idle_timeout_ms: 200,
        rate_limit_per_second: 1000,
        min_interval_ms: 0,
    }
}

pub fn memory_relays(count: usize) -> Vec<Arc<MemoryRelay>> {
    (0..count)
        .map(|i| Arc::new(MemoryRelay::new(format!("memory://relay-{}", i))))
        .collect()
}

pub fn store_on(keys: &Keys, relays: &[Arc<MemoryRelay>]) -> SecretStore {
    init_tracing();
    let mut store = SecretStore::new(keys.clone(), fast_config());
    store.connect_relays(relays.iter().map(|r| r.clone() as Arc<dyn Relay>).collect());
    store
}

pub fn bundle(pairs: &[(&str, &str)]) -> SecretBundle {
    SecretBundle::from_pairs(pairs.iter().copied()).unwrap()
}
