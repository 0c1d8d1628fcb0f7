// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Storage key derivation for cached decryption signatures.
//!
//! ```text
//! sig:<user>:<contract>,<contract>,...[:<first 20 chars of public key>]
//! ```
//!
//! Addresses are lower-cased and contracts sorted and deduplicated, so the
//! same authorization always maps to the same key no matter the input order
//! or the instance that produced it.

use alloy::primitives::Address;

/// Prefix of every signature key.
pub const KEY_PREFIX: &str = "sig";

/// Number of public key characters appended in public-key mode.
pub const PUBLIC_KEY_SEGMENT_LEN: usize = 20;

/// Lower-cased `0x` address.
pub fn lowercase_address(address: &Address) -> String {
    address.to_string().to_lowercase()
}

/// Sort and deduplicate contract addresses.
pub fn normalize_addresses(addresses: &[Address]) -> Vec<Address> {
    let mut sorted = addresses.to_vec();
    sorted.sort();
    sorted.dedup();
    sorted
}

/// Derive the storage key for a `(user, contracts, public key)` triple.
pub fn storage_key(
    user_address: &Address,
    contract_addresses: &[Address],
    public_key: Option<&str>,
) -> String {
    let contracts = normalize_addresses(contract_addresses)
        .iter()
        .map(lowercase_address)
        .collect::<Vec<_>>()
        .join(",");

    let mut key = format!("{KEY_PREFIX}:{}:{contracts}", lowercase_address(user_address));
    if let Some(public_key) = public_key {
        key.push(':');
        key.extend(public_key.chars().take(PUBLIC_KEY_SEGMENT_LEN));
    }
    key
}
