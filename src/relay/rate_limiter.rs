// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Rate limiting for outbound relay operations

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovRateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use super::error::RelayError;

/// Default outbound operations per second
pub const DEFAULT_OPS_PER_SECOND: u32 = 10;

/// Default minimum spacing between operations
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Token bucket shared by every query and publish of a pool
///
/// One token is taken per logical operation (a query fan-out or a publish
/// attempt), not per relay.
#[derive(Clone)]
pub struct RelayRateLimiter {
    limiter: Arc<GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    ops_per_second: u32,
    interval: Duration,
}

impl RelayRateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `ops_per_second` - Maximum operations per second (0 falls back to the default)
    /// * `min_interval` - Minimum spacing between two operations
    pub fn new(ops_per_second: u32, min_interval: Duration) -> Self {
        let ops_per_second = if ops_per_second == 0 {
            DEFAULT_OPS_PER_SECOND
        } else {
            ops_per_second
        };
        let interval = (Duration::from_secs(1) / ops_per_second).max(min_interval);
        let quota = Quota::with_period(interval)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX));

        Self {
            limiter: Arc::new(GovRateLimiter::direct(quota)),
            ops_per_second,
            interval,
        }
    }

    /// No throttling; for tests and local relays
    pub fn unlimited() -> Self {
        Self {
            limiter: Arc::new(GovRateLimiter::direct(Quota::per_second(NonZeroU32::MAX))),
            ops_per_second: u32::MAX,
            interval: Duration::ZERO,
        }
    }

    /// Take a token if one is available right now
    pub fn check(&self) -> Result<(), RelayError> {
        self.limiter.check().map_err(|_| RelayError::RateLimited)
    }

    /// Wait until a token is available
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    pub fn ops_per_second(&self) -> u32 {
        self.ops_per_second
    }

    /// Effective spacing between operations
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for RelayRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_OPS_PER_SECOND, DEFAULT_MIN_INTERVAL)
    }
}

impl std::fmt::Debug for RelayRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayRateLimiter")
            .field("ops_per_second", &self.ops_per_second)
            .field("interval", &self.interval)
            .finish()
    }
}
