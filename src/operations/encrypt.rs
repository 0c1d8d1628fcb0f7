// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use alloy::primitives::Address;

use crate::error::SdkResult;
use crate::instance::{EncryptedInput, EncryptedValue, FhevmInstance};

/// Encrypt `values` as one input bound to `(contract_address, user_address)`.
///
/// Handles come back in the order of `values`.
pub async fn encrypt_values(
    instance: &dyn FhevmInstance,
    contract_address: Address,
    user_address: Address,
    values: &[EncryptedValue],
) -> SdkResult<EncryptedInput> {
    let mut input = instance.create_encrypted_input(contract_address, user_address);
    for value in values {
        input.add(*value);
    }

    let encrypted = input.encrypt().await?;
    tracing::debug!(
        contract = %contract_address,
        user = %user_address,
        handles = encrypted.handles.len(),
        "Encrypted input"
    );
    Ok(encrypted)
}
