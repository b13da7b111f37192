// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Relay Transport
//!
//! - **transport**: the `Relay` trait for one endpoint
//! - **websocket** / **memory**: network and in-process relays
//! - **pool**: fan-out queries with dedupe, publishes with retry and backoff
//! - **rate_limiter**: token bucket shared by all outbound operations

pub mod error;
pub mod memory;
pub mod message;
pub mod pool;
pub mod rate_limiter;
pub mod transport;
pub mod websocket;

pub use error::RelayError;
pub use memory::MemoryRelay;
pub use message::{ClientMessage, RelayMessage};
pub use pool::{PoolOptions, PublishOutcome, RelayPool, Subscription};
pub use rate_limiter::RelayRateLimiter;
pub use transport::Relay;
pub use websocket::WebSocketRelay;
