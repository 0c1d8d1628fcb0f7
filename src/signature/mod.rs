// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Decryption Signatures
//!
//! A [`DecryptionSignature`] authorizes an ephemeral keypair to receive
//! re-encrypted values for a set of contracts on behalf of a user. It is
//! obtained by having the wallet sign EIP-712 typed data built by the
//! instance, and is valid for `duration_days` days from `start_timestamp`.
//!
//! ## Lifecycle
//!
//! 1. [`DecryptionSignature::load_or_sign`] looks for a valid cached
//!    signature under the derived [`storage_key`].
//! 2. On a miss it obtains a keypair, asks the wallet to sign, and caches
//!    the result (best-effort).
//! 3. Expired entries are ignored, not deleted.
//!
//! Failures never surface as errors from the high-level operations: every
//! problem is logged and collapses to `None`. [`DecryptionSignature::try_create`]
//! keeps the error for callers that need to tell causes apart.
//!
//! `load_or_sign` does not deduplicate concurrent calls; wrap it in a
//! [`SigningGate`] when at-most-once signing per key matters.

pub mod eip712;
pub mod gate;
pub mod key;

use std::fmt;
use std::sync::Arc;

use alloy::primitives::Address;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::instance::{FhevmInstance, HandleContractPair, InstanceError, KeyPair, UserDecryptRequest};
use crate::provider::{sign_typed_data, Eip1193Provider, ProviderError};
use crate::storage::{StorageAdapter, StorageError};

pub use eip712::Eip712Value;
pub use gate::SigningGate;
pub use key::{lowercase_address, normalize_addresses, storage_key};

/// Validity window used by [`DecryptionSignature::create`].
pub const DEFAULT_DURATION_DAYS: u64 = 1;

const SECONDS_PER_DAY: u64 = 86_400;

/// Errors raised while producing or decoding a signature.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error("Wallet signing failed: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid signature record: {0}")]
    InvalidRecord(String),

    #[error("Invalid EIP-712 payload: {0}")]
    Eip712(String),

    #[error("Instance cannot generate keypairs")]
    KeypairUnavailable,
}

/// Wallet used to sign the authorization.
#[derive(Clone)]
pub struct SignerParams {
    pub provider: Arc<dyn Eip1193Provider>,
    pub user_address: Address,
}

impl SignerParams {
    pub fn new(provider: Arc<dyn Eip1193Provider>, user_address: Address) -> Self {
        Self {
            provider,
            user_address,
        }
    }
}

impl fmt::Debug for SignerParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerParams")
            .field("user_address", &self.user_address)
            .finish_non_exhaustive()
    }
}

/// Raw fields of a signature. Addresses are normalized on conversion.
#[derive(Debug, Clone)]
pub struct SignatureParts {
    pub public_key: String,
    pub private_key: String,
    pub signature: String,
    pub start_timestamp: u64,
    pub duration_days: u64,
    pub user_address: Address,
    pub contract_addresses: Vec<Address>,
    pub eip712: Eip712Value,
}

/// Persisted JSON shape.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureRecord {
    public_key: String,
    private_key: String,
    signature: String,
    start_timestamp: u64,
    duration_days: u64,
    user_address: String,
    contract_addresses: Vec<String>,
    eip712: Eip712Value,
}

/// An EIP-712 user-decryption authorization.
#[derive(Clone, PartialEq)]
pub struct DecryptionSignature {
    public_key: String,
    private_key: String,
    signature: String,
    start_timestamp: u64,
    duration_days: u64,
    user_address: Address,
    contract_addresses: Vec<Address>,
    eip712: Eip712Value,
}

impl From<SignatureParts> for DecryptionSignature {
    fn from(parts: SignatureParts) -> Self {
        Self {
            public_key: parts.public_key,
            private_key: parts.private_key,
            signature: parts.signature,
            start_timestamp: parts.start_timestamp,
            duration_days: parts.duration_days,
            user_address: parts.user_address,
            contract_addresses: normalize_addresses(&parts.contract_addresses),
            eip712: parts.eip712,
        }
    }
}

impl fmt::Debug for DecryptionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionSignature")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("signature", &self.signature)
            .field("start_timestamp", &self.start_timestamp)
            .field("duration_days", &self.duration_days)
            .field("user_address", &self.user_address)
            .field("contract_addresses", &self.contract_addresses)
            .finish_non_exhaustive()
    }
}

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

impl DecryptionSignature {
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn start_timestamp(&self) -> u64 {
        self.start_timestamp
    }

    pub fn duration_days(&self) -> u64 {
        self.duration_days
    }

    pub fn user_address(&self) -> Address {
        self.user_address
    }

    /// Sorted, deduplicated.
    pub fn contract_addresses(&self) -> &[Address] {
        &self.contract_addresses
    }

    pub fn eip712(&self) -> &Eip712Value {
        &self.eip712
    }

    /// Unix time at which the signature stops being valid.
    pub fn expires_at(&self) -> u64 {
        self.start_timestamp
            .saturating_add(self.duration_days.saturating_mul(SECONDS_PER_DAY))
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(unix_now())
    }

    /// Valid strictly before `start_timestamp + duration_days * 86400`.
    pub fn is_valid_at(&self, now: u64) -> bool {
        now < self.expires_at()
    }

    /// Key under which this signature is cached.
    pub fn storage_key(&self, with_public_key: bool) -> String {
        storage_key(
            &self.user_address,
            &self.contract_addresses,
            with_public_key.then_some(self.public_key.as_str()),
        )
    }

    /// Request for [`FhevmInstance::user_decrypt`] authorized by this signature.
    pub fn user_decrypt_request(&self, handles: Vec<HandleContractPair>) -> UserDecryptRequest {
        UserDecryptRequest {
            handles,
            private_key: self.private_key.clone(),
            public_key: self.public_key.clone(),
            signature: self.signature.clone(),
            contract_addresses: self.contract_addresses.clone(),
            user_address: self.user_address,
            start_timestamp: self.start_timestamp,
            duration_days: self.duration_days,
        }
    }

    pub fn serialize(&self) -> Result<String, SignatureError> {
        let record = SignatureRecord {
            public_key: self.public_key.clone(),
            private_key: self.private_key.clone(),
            signature: self.signature.clone(),
            start_timestamp: self.start_timestamp,
            duration_days: self.duration_days,
            user_address: lowercase_address(&self.user_address),
            contract_addresses: self
                .contract_addresses
                .iter()
                .map(Address::to_string)
                .collect(),
            eip712: self.eip712.clone(),
        };

        serde_json::to_string(&record).map_err(|e| SignatureError::InvalidRecord(e.to_string()))
    }

    /// Parse a persisted record, rejecting missing or mistyped fields.
    pub fn deserialize(json: &str) -> Result<Self, SignatureError> {
        let record: SignatureRecord =
            serde_json::from_str(json).map_err(|e| SignatureError::InvalidRecord(e.to_string()))?;

        if record.eip712.as_object().is_none() {
            return Err(SignatureError::InvalidRecord(
                "eip712 must be an object".to_string(),
            ));
        }

        let user_address = parse_address(&record.user_address)?;
        let contract_addresses = record
            .contract_addresses
            .iter()
            .map(|raw| parse_address(raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from(SignatureParts {
            public_key: record.public_key,
            private_key: record.private_key,
            signature: record.signature,
            start_timestamp: record.start_timestamp,
            duration_days: record.duration_days,
            user_address,
            contract_addresses,
            eip712: record.eip712,
        }))
    }

    /// Sign a new authorization, keeping the failure cause.
    pub async fn try_create(
        instance: &dyn FhevmInstance,
        contract_addresses: &[Address],
        public_key: &str,
        private_key: &str,
        signer: &SignerParams,
        duration_days: u64,
    ) -> Result<Self, SignatureError> {
        let contract_addresses = normalize_addresses(contract_addresses);
        let start_timestamp = unix_now();

        let mut eip712 =
            instance.create_eip712(public_key, &contract_addresses, start_timestamp, duration_days)?;
        eip712.normalize_chain_id().map_err(SignatureError::Eip712)?;

        let signature = sign_typed_data(
            signer.provider.as_ref(),
            signer.user_address,
            &eip712.to_json(),
        )
        .await?;

        Ok(Self::from(SignatureParts {
            public_key: public_key.to_string(),
            private_key: private_key.to_string(),
            signature,
            start_timestamp,
            duration_days,
            user_address: signer.user_address,
            contract_addresses,
            eip712,
        }))
    }

    /// Sign a new authorization valid for [`DEFAULT_DURATION_DAYS`].
    ///
    /// Returns `None` on any failure (user rejection included).
    pub async fn create(
        instance: &dyn FhevmInstance,
        contract_addresses: &[Address],
        public_key: &str,
        private_key: &str,
        signer: &SignerParams,
    ) -> Option<Self> {
        match Self::try_create(
            instance,
            contract_addresses,
            public_key,
            private_key,
            signer,
            DEFAULT_DURATION_DAYS,
        )
        .await
        {
            Ok(signature) => Some(signature),
            Err(e) => {
                tracing::error!(
                    user = %signer.user_address,
                    contracts = contract_addresses.len(),
                    error = %e,
                    "Failed to create decryption signature"
                );
                None
            }
        }
    }

    /// Cache the signature. Best-effort: failures are logged.
    pub async fn save_to_storage(&self, storage: &dyn StorageAdapter, with_public_key: bool) {
        let key = self.storage_key(with_public_key);
        let result = match self.serialize() {
            Ok(json) => storage.set_item(&key, &json).await.map_err(SignatureError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => tracing::debug!(key = %key, "Cached decryption signature"),
            Err(e) => tracing::warn!(key = %key, error = %e, "Failed to cache decryption signature"),
        }
    }

    /// Load a cached, still valid signature.
    pub async fn load_from_storage(
        storage: &dyn StorageAdapter,
        contract_addresses: &[Address],
        user_address: Address,
        public_key: Option<&str>,
    ) -> Option<Self> {
        let key = storage_key(&user_address, contract_addresses, public_key);

        let json = match storage.get_item(&key).await {
            Ok(Some(json)) => json,
            Ok(None) => {
                tracing::debug!(key = %key, "No cached decryption signature");
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read cached decryption signature");
                return None;
            }
        };

        let signature = match Self::deserialize(&json) {
            Ok(signature) => signature,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Ignoring malformed cached decryption signature");
                return None;
            }
        };

        // The key holds only a public-key prefix
        if let Some(public_key) = public_key {
            if signature.public_key() != public_key {
                tracing::debug!(key = %key, "Cached decryption signature belongs to another keypair");
                return None;
            }
        }

        if !signature.is_valid() {
            tracing::debug!(
                key = %key,
                expired_at = signature.expires_at(),
                "Ignoring expired decryption signature"
            );
            return None;
        }

        Some(signature)
    }

    /// Return a cached signature or sign and cache a new one.
    ///
    /// With `key_pair`, the cache key includes the public key and the given
    /// keypair is used for signing. Without it, a fresh keypair is requested
    /// from the instance.
    pub async fn load_or_sign(
        instance: &dyn FhevmInstance,
        contract_addresses: &[Address],
        signer: &SignerParams,
        storage: &dyn StorageAdapter,
        key_pair: Option<&KeyPair>,
    ) -> Option<Self> {
        let cached = Self::load_from_storage(
            storage,
            contract_addresses,
            signer.user_address,
            key_pair.map(|pair| pair.public_key.as_str()),
        )
        .await;
        if cached.is_some() {
            return cached;
        }

        let generated;
        let pair = match key_pair {
            Some(pair) => pair,
            None => match instance.generate_keypair() {
                Some(pair) => {
                    generated = pair;
                    &generated
                }
                None => {
                    tracing::error!(
                        error = %SignatureError::KeypairUnavailable,
                        "Cannot sign decryption authorization"
                    );
                    return None;
                }
            },
        };

        let signature = Self::create(
            instance,
            contract_addresses,
            &pair.public_key,
            &pair.private_key,
            signer,
        )
        .await?;

        signature.save_to_storage(storage, key_pair.is_some()).await;
        Some(signature)
    }
}

fn parse_address(raw: &str) -> Result<Address, SignatureError> {
    raw.parse()
        .map_err(|e| SignatureError::InvalidRecord(format!("invalid address `{raw}`: {e}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::instance::tests::FakeInstance;
    use crate::provider::tests::ScriptedProvider;
    use crate::provider::LocalSignerProvider;
    use crate::storage::{MemoryStorage, NoopStorage};
    use alloy::primitives::{address, U256};
    use serde_json::{json, Value};

    pub(crate) const TEST_KEY: &str =
        "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const A: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    const B: Address = address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

    /// Provider signing with a real local key and counting signature requests.
    pub(crate) struct CountingSigner {
        inner: LocalSignerProvider,
        pub signs: std::sync::atomic::AtomicUsize,
    }

    impl CountingSigner {
        pub fn new() -> Self {
            Self {
                inner: LocalSignerProvider::from_hex(TEST_KEY, 11_155_111).unwrap(),
                signs: Default::default(),
            }
        }

        pub fn count(&self) -> usize {
            self.signs.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Eip1193Provider for CountingSigner {
        async fn request(
            &self,
            args: crate::provider::RequestArguments,
        ) -> Result<Value, ProviderError> {
            if args.method == "eth_signTypedData_v4" {
                self.signs.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
            self.inner.request(args).await
        }
    }

    pub(crate) fn signer_params(provider: Arc<CountingSigner>) -> SignerParams {
        let user = provider.inner.address();
        SignerParams::new(provider, user)
    }

    fn sample(start_timestamp: u64, duration_days: u64) -> DecryptionSignature {
        let mut eip712 = Eip712Value::from_json(json!({
            "domain": { "name": "Decryption", "chainId": 0 },
            "message": { "durationDays": duration_days.to_string() }
        }));
        eip712.set_path(&["domain", "chainId"], Eip712Value::BigInt(U256::MAX));

        DecryptionSignature::from(SignatureParts {
            public_key: "0xpublickey0123456789abcdef".to_string(),
            private_key: "0xprivate".to_string(),
            signature: "0xsig".to_string(),
            start_timestamp,
            duration_days,
            user_address: address!("AbCdEf0000000000000000000000000000000001"),
            contract_addresses: vec![B, A, B],
            eip712,
        })
    }

    #[test]
    fn contracts_are_sorted_and_deduplicated() {
        assert_eq!(sample(0, 1).contract_addresses(), &[A, B]);
    }

    #[test]
    fn validity_window_boundaries() {
        let t = 1_700_000_000;
        let signature = sample(t, 1);
        assert!(signature.is_valid_at(t));
        assert!(signature.is_valid_at(t + 86_399));
        assert!(!signature.is_valid_at(t + 86_400));
        assert!(!signature.is_valid_at(t + 86_401));

        assert!(!sample(t, 0).is_valid_at(t));
        assert!(sample(unix_now(), 1).is_valid());
        assert!(!sample(1, 1).is_valid());
    }

    #[test]
    fn serialize_round_trip_keeps_bigints() {
        let signature = sample(1_700_000_000, 7);
        let json = signature.serialize().unwrap();

        let raw: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            raw["userAddress"],
            json!("0xabcdef0000000000000000000000000000000001")
        );
        assert_eq!(
            raw["eip712"]["domain"]["chainId"],
            json!({ "__type": "bigint", "value": U256::MAX.to_string() })
        );

        let back = DecryptionSignature::deserialize(&json).unwrap();
        assert_eq!(back, signature);
    }

    #[test]
    fn deserialize_rejects_each_missing_field() {
        let full: Value = serde_json::from_str(&sample(1, 1).serialize().unwrap()).unwrap();
        let fields = [
            "publicKey",
            "privateKey",
            "signature",
            "startTimestamp",
            "durationDays",
            "userAddress",
            "contractAddresses",
            "eip712",
        ];

        for field in fields {
            let mut partial = full.clone();
            partial.as_object_mut().unwrap().remove(field);
            let result = DecryptionSignature::deserialize(&partial.to_string());
            assert!(
                matches!(result, Err(SignatureError::InvalidRecord(_))),
                "missing `{field}` should be rejected"
            );
        }
    }

    #[test]
    fn deserialize_rejects_mistyped_fields() {
        let full: Value = serde_json::from_str(&sample(1, 1).serialize().unwrap()).unwrap();
        let mistyped = [
            ("startTimestamp", json!("1700000000")),
            ("durationDays", json!(-1)),
            ("contractAddresses", json!("0xaaaa")),
            ("userAddress", json!("not-an-address")),
            ("eip712", json!("typed data")),
            ("signature", json!(42)),
        ];

        for (field, value) in mistyped {
            let mut record = full.clone();
            record[field] = value;
            assert!(
                DecryptionSignature::deserialize(&record.to_string()).is_err(),
                "mistyped `{field}` should be rejected"
            );
        }
        assert!(DecryptionSignature::deserialize("{").is_err());
    }

    #[test]
    fn debug_output_hides_private_key() {
        let rendered = format!("{:?}", sample(1, 1));
        assert!(!rendered.contains("0xprivate"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn create_signs_normalized_typed_data() {
        let instance = FakeInstance::default();
        let provider = Arc::new(CountingSigner::new());
        let signer = signer_params(provider.clone());

        let signature = DecryptionSignature::create(&instance, &[B, A], "0x0a0b", "0x0c0d", &signer)
            .await
            .unwrap();

        assert_eq!(provider.count(), 1);
        assert_eq!(signature.duration_days(), DEFAULT_DURATION_DAYS);
        assert_eq!(signature.contract_addresses(), &[A, B]);
        assert_eq!(signature.user_address(), signer.user_address);
        assert_eq!(signature.signature().len(), 132);
        assert_eq!(
            signature.eip712().get_path(&["domain", "chainId"]),
            Some(&Eip712Value::Number(11_155_111u64.into()))
        );

        let calls = instance.eip712_calls.lock().unwrap();
        assert_eq!(calls[0].1, vec![A, B]);
        assert_eq!(calls[0].3, DEFAULT_DURATION_DAYS);
        assert!(signature.is_valid());
    }

    #[tokio::test]
    async fn create_collapses_rejection_to_none() {
        let instance = FakeInstance::default();
        let provider = Arc::new(ScriptedProvider {
            responses: vec![("eth_signTypedData_v4", Err(ProviderError::UserRejected))],
            ..Default::default()
        });
        let signer = SignerParams::new(provider, A);

        assert!(DecryptionSignature::create(&instance, &[A], "0xpub", "0xpriv", &signer)
            .await
            .is_none());

        let err = DecryptionSignature::try_create(&instance, &[A], "0xpub", "0xpriv", &signer, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, SignatureError::Provider(ProviderError::UserRejected)));
    }

    #[tokio::test]
    async fn save_and_load_with_and_without_public_key() {
        let storage = MemoryStorage::new();
        let signature = sample(unix_now(), 1);
        let user = signature.user_address();

        signature.save_to_storage(&storage, false).await;
        let loaded = DecryptionSignature::load_from_storage(&storage, &[A, B], user, None)
            .await
            .unwrap();
        assert_eq!(loaded, signature);

        // Public-key mode uses a different key
        assert!(DecryptionSignature::load_from_storage(
            &storage,
            &[A, B],
            user,
            Some(signature.public_key())
        )
        .await
        .is_none());

        signature.save_to_storage(&storage, true).await;
        assert!(DecryptionSignature::load_from_storage(
            &storage,
            &[B, A],
            user,
            Some(signature.public_key())
        )
        .await
        .is_some());
        assert_eq!(storage.len(), 2);
    }

    #[tokio::test]
    async fn load_ignores_expired_and_malformed_entries() {
        let storage = MemoryStorage::new();
        let expired = sample(1_000, 1);
        expired.save_to_storage(&storage, false).await;
        let user = expired.user_address();

        assert!(DecryptionSignature::load_from_storage(&storage, &[A, B], user, None)
            .await
            .is_none());
        // Expired entries are ignored, not deleted
        assert_eq!(storage.len(), 1);

        storage
            .set_item(&storage_key(&user, &[A], None), "{\"publicKey\":\"x\"}")
            .await
            .unwrap();
        assert!(DecryptionSignature::load_from_storage(&storage, &[A], user, None)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn load_or_sign_hits_cache_regardless_of_contract_order() {
        let instance = FakeInstance::with_keypairs();
        let provider = Arc::new(CountingSigner::new());
        let signer = signer_params(provider.clone());
        let storage = MemoryStorage::new();

        let first = DecryptionSignature::load_or_sign(&instance, &[B, A], &signer, &storage, None)
            .await
            .unwrap();
        assert_eq!(provider.count(), 1);

        let second = DecryptionSignature::load_or_sign(&instance, &[A, B], &signer, &storage, None)
            .await
            .unwrap();
        assert_eq!(provider.count(), 1, "cache hit must not sign again");
        assert_eq!(second, first);
        assert_eq!(
            instance
                .keypairs_generated
                .load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }

    #[tokio::test]
    async fn load_or_sign_with_provided_keypair_uses_public_key_mode() {
        let instance = FakeInstance::default();
        let provider = Arc::new(CountingSigner::new());
        let signer = signer_params(provider.clone());
        let storage = MemoryStorage::new();
        let pair = KeyPair {
            public_key: "0x00112233445566778899aabbccddeeff00112233".to_string(),
            private_key: "0x99".to_string(),
        };

        let signature =
            DecryptionSignature::load_or_sign(&instance, &[A], &signer, &storage, Some(&pair))
                .await
                .unwrap();
        assert_eq!(signature.public_key(), pair.public_key);

        let key = storage_key(&signer.user_address, &[A], Some(&pair.public_key));
        assert!(storage.get_item(&key).await.unwrap().is_some());

        DecryptionSignature::load_or_sign(&instance, &[A], &signer, &storage, Some(&pair))
            .await
            .unwrap();
        assert_eq!(provider.count(), 1);
    }

    #[tokio::test]
    async fn keypairs_sharing_a_key_prefix_do_not_share_signatures() {
        let instance = FakeInstance::default();
        let provider = Arc::new(CountingSigner::new());
        let signer = signer_params(provider.clone());
        let storage = MemoryStorage::new();
        let first = KeyPair {
            public_key: "0x2000000000000000000000AAAA".to_string(),
            private_key: "0x01".to_string(),
        };
        let second = KeyPair {
            public_key: "0x2000000000000000000000BBBB".to_string(),
            private_key: "0x02".to_string(),
        };
        assert_eq!(
            storage_key(&signer.user_address, &[A], Some(&first.public_key)),
            storage_key(&signer.user_address, &[A], Some(&second.public_key))
        );

        DecryptionSignature::load_or_sign(&instance, &[A], &signer, &storage, Some(&first))
            .await
            .unwrap();
        let signature =
            DecryptionSignature::load_or_sign(&instance, &[A], &signer, &storage, Some(&second))
                .await
                .unwrap();

        assert_eq!(signature.public_key(), second.public_key);
        assert_eq!(provider.count(), 2);
        assert!(DecryptionSignature::load_from_storage(
            &storage,
            &[A],
            signer.user_address,
            Some(&first.public_key)
        )
        .await
        .is_none());
    }

    #[tokio::test]
    async fn load_or_sign_without_keypair_capability_is_none() {
        let instance = FakeInstance::default();
        let provider = Arc::new(CountingSigner::new());
        let signer = signer_params(provider.clone());

        let result =
            DecryptionSignature::load_or_sign(&instance, &[A], &signer, &MemoryStorage::new(), None)
                .await;
        assert!(result.is_none());
        assert_eq!(provider.count(), 0);
    }

    #[tokio::test]
    async fn load_or_sign_with_noop_storage_signs_every_time() {
        let instance = FakeInstance::with_keypairs();
        let provider = Arc::new(CountingSigner::new());
        let signer = signer_params(provider.clone());

        for _ in 0..2 {
            DecryptionSignature::load_or_sign(&instance, &[A], &signer, &NoopStorage, None)
                .await
                .unwrap();
        }
        assert_eq!(provider.count(), 2);
    }

    #[test]
    fn user_decrypt_request_carries_authorization() {
        let signature = sample(5, 2);
        let request = signature.user_decrypt_request(vec![HandleContractPair {
            handle: "0x01".to_string(),
            contract_address: A,
        }]);
        assert_eq!(request.contract_addresses, vec![A, B]);
        assert_eq!(request.start_timestamp, 5);
        assert_eq!(request.duration_days, 2);
        assert_eq!(request.signature, "0xsig");
    }
}
