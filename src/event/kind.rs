// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Event kind numbers

/// Advisory deletion request listing target event ids
pub const DELETION: u16 = 5;

/// Rumor encrypted to the recipient and signed by the real author
pub const SEAL: u16 = 13;

/// Outer envelope signed by a one-time key; the only kind relays ever see from us
pub const GIFT_WRAP: u16 = 1059;

/// Addressable application-data kind carried by secret-bundle rumors
pub const SECRET_BUNDLE: u16 = 30078;

/// Addressable (parameterized replaceable) kinds, replaced per `d` tag
pub fn is_addressable(kind: u16) -> bool {
    (30000..40000).contains(&kind)
}
