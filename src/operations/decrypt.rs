// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::HashMap;

use crate::error::{SdkError, SdkResult};
use crate::instance::{ClearValue, FhevmInstance, HandleContractPair, KeyPair, PublicDecryptResult};
use crate::signature::{normalize_addresses, SignerParams, SigningGate};
use crate::storage::StorageAdapter;

/// Decrypt handles the user is allowed to read.
///
/// Reuses a cached decryption signature for the handles' contracts or asks
/// the wallet for one (at most once per key, through `gate`).
pub async fn user_decrypt_handles(
    instance: &dyn FhevmInstance,
    handles: Vec<HandleContractPair>,
    signer: &SignerParams,
    storage: &dyn StorageAdapter,
    gate: &SigningGate,
    key_pair: Option<&KeyPair>,
) -> SdkResult<HashMap<String, ClearValue>> {
    if handles.is_empty() {
        return Ok(HashMap::new());
    }

    let contracts: Vec<_> = handles.iter().map(|pair| pair.contract_address).collect();
    let contracts = normalize_addresses(&contracts);

    let signature = gate
        .load_or_sign(instance, &contracts, signer, storage, key_pair)
        .await
        .ok_or(SdkError::SignatureUnavailable)?;

    let count = handles.len();
    let values = instance
        .user_decrypt(signature.user_decrypt_request(handles))
        .await?;

    tracing::debug!(
        user = %signer.user_address,
        contracts = contracts.len(),
        handles = count,
        "User decryption complete"
    );
    Ok(values)
}

/// Decrypt publicly decryptable handles. No signature is involved.
pub async fn public_decrypt_handles(
    instance: &dyn FhevmInstance,
    handles: Vec<String>,
) -> SdkResult<PublicDecryptResult> {
    let count = handles.len();
    let result = instance.public_decrypt(handles).await?;
    tracing::debug!(handles = count, "Public decryption complete");
    Ok(result)
}
