// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! At-most-once signing per storage key.
//!
//! Two UI components asking for the same authorization at the same time would
//! otherwise both miss the cache and both prompt the wallet. The gate keeps one
//! async lock per storage key; the second caller waits, then finds the first
//! caller's signature in storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::primitives::Address;

use super::{storage_key, DecryptionSignature, SignerParams};
use crate::instance::{FhevmInstance, KeyPair};
use crate::storage::StorageAdapter;

type KeyLock = Arc<tokio::sync::Mutex<()>>;

/// Serializes [`DecryptionSignature::load_or_sign`] calls that share a key.
#[derive(Debug, Default)]
pub struct SigningGate {
    pending: Mutex<HashMap<String, KeyLock>>,
}

impl SigningGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with a signing request in flight.
    pub fn pending(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    pub async fn load_or_sign(
        &self,
        instance: &dyn FhevmInstance,
        contract_addresses: &[Address],
        signer: &SignerParams,
        storage: &dyn StorageAdapter,
        key_pair: Option<&KeyPair>,
    ) -> Option<DecryptionSignature> {
        let key = storage_key(
            &signer.user_address,
            contract_addresses,
            key_pair.map(|pair| pair.public_key.as_str()),
        );

        let lock = self.acquire(&key)?;
        let result = {
            let _guard = lock.lock().await;
            DecryptionSignature::load_or_sign(instance, contract_addresses, signer, storage, key_pair)
                .await
        };

        self.release(&key, lock);
        result
    }

    fn acquire(&self, key: &str) -> Option<KeyLock> {
        let mut pending = match self.pending.lock() {
            Ok(pending) => pending,
            Err(_) => {
                tracing::error!(key = %key, "Signing gate lock poisoned");
                return None;
            }
        };
        Some(pending.entry(key.to_string()).or_default().clone())
    }

    fn release(&self, key: &str, lock: KeyLock) {
        if let Ok(mut pending) = self.pending.lock() {
            // Only the map and this handle are left: nobody else is waiting
            if Arc::strong_count(&lock) == 2 {
                pending.remove(key);
            }
        }
    }
}
