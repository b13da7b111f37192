// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the secret store

use std::env;
use std::time::Duration;

pub mod relays;

pub use relays::{parse_relay_list, validate_relay_url, DEFAULT_RELAYS};

use crate::relay::PoolOptions;

/// Relay set plus timing, retry and rate-limit policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Relay URLs (`ws://` or `wss://`)
    pub relays: Vec<String>,
    /// Per-attempt publish timeout in milliseconds
    pub publish_timeout_ms: u64,
    /// Publish attempts before giving up
    pub publish_attempts: u32,
    /// Base delay for exponential backoff in milliseconds
    pub retry_base_delay_ms: u64,
    /// Inactivity window that ends a relay's query, in milliseconds
    pub query_idle_timeout_ms: u64,
    /// Outbound operations per second
    pub rate_limit_per_second: u32,
    /// Minimum spacing between outbound operations in milliseconds
    pub min_interval_ms: u64,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl StoreConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let relays = env::var("REDSHIFT_RELAYS")
            .map(|v| parse_relay_list(&v))
            .ok()
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.relays);

        Self {
            relays,
            publish_timeout_ms: env_or("REDSHIFT_PUBLISH_TIMEOUT_MS", defaults.publish_timeout_ms),
            publish_attempts: env_or("REDSHIFT_PUBLISH_ATTEMPTS", defaults.publish_attempts),
            retry_base_delay_ms: env_or("REDSHIFT_RETRY_BASE_DELAY_MS", defaults.retry_base_delay_ms),
            query_idle_timeout_ms: env_or(
                "REDSHIFT_QUERY_IDLE_TIMEOUT_MS",
                defaults.query_idle_timeout_ms,
            ),
            rate_limit_per_second: env_or(
                "REDSHIFT_RATE_LIMIT_PER_SECOND",
                defaults.rate_limit_per_second,
            ),
            min_interval_ms: defaults.min_interval_ms,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for relay in &self.relays {
            validate_relay_url(relay).map_err(|e| e.to_string())?;
        }
        if self.publish_timeout_ms == 0 {
            return Err("Publish timeout must be greater than 0".to_string());
        }
        if self.publish_attempts == 0 {
            return Err("Publish attempts must be greater than 0".to_string());
        }
        if self.query_idle_timeout_ms == 0 {
            return Err("Query idle timeout must be greater than 0".to_string());
        }
        if self.rate_limit_per_second == 0 {
            return Err("Rate limit must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            publish_timeout: Duration::from_millis(self.publish_timeout_ms),
            publish_attempts: self.publish_attempts,
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms),
            query_idle_timeout: Duration::from_millis(self.query_idle_timeout_ms),
            rate_limit_per_second: self.rate_limit_per_second,
            min_interval: Duration::from_millis(self.min_interval_ms),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            relays: DEFAULT_RELAYS.iter().map(|r| r.to_string()).collect(),
            publish_timeout_ms: 5000,
            publish_attempts: 3,
            retry_base_delay_ms: 1000,
            query_idle_timeout_ms: 3000,
            rate_limit_per_second: 10,
            min_interval_ms: 100,
        }
    }
}
