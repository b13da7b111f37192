// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Event model shared by the gift-wrap engine and the relay transport

pub mod filter;
pub mod kind;
pub mod model;

pub use filter::Filter;
pub use model::{compute_id, Event, Tags, UnsignedEvent};

/// Current unix time in seconds
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
