// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Opaque FHEVM instance boundary.
//!
//! The cryptographic instance (encryption, KMS-backed decryption, EIP-712
//! construction, keypair generation) lives outside this crate. These traits
//! describe exactly what the SDK consumes from it.

pub mod mock;
pub mod sdk;

use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::signature::Eip712Value;

pub use sdk::{InstanceConfig, RelayerSdk, RelayerSdkGlobal};

/// Errors reported by the instance or the relayer SDK.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InstanceError {
    #[error("Relayer SDK initialization failed: {0}")]
    Init(String),

    #[error("Instance creation failed: {0}")]
    Creation(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("EIP-712 construction failed: {0}")]
    Eip712(String),
}

/// Ephemeral keypair used for user decryption (opaque hex/base64 strings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    pub public_key: String,
    pub private_key: String,
}

/// A cleartext value queued for encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptedValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    U256(U256),
    Address(Address),
}

/// Output of [`EncryptedInputBuilder::encrypt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    /// One handle per added value, in insertion order
    pub handles: Vec<Vec<u8>>,
    pub input_proof: Vec<u8>,
}

/// Accumulates values bound to a `(contract, user)` pair, then encrypts them.
#[async_trait]
pub trait EncryptedInputBuilder: Send {
    fn add(&mut self, value: EncryptedValue);

    async fn encrypt(&mut self) -> Result<EncryptedInput, InstanceError>;

    fn add_bool(&mut self, value: bool) {
        self.add(EncryptedValue::Bool(value));
    }

    fn add8(&mut self, value: u8) {
        self.add(EncryptedValue::U8(value));
    }

    fn add16(&mut self, value: u16) {
        self.add(EncryptedValue::U16(value));
    }

    fn add32(&mut self, value: u32) {
        self.add(EncryptedValue::U32(value));
    }

    fn add64(&mut self, value: u64) {
        self.add(EncryptedValue::U64(value));
    }

    fn add128(&mut self, value: u128) {
        self.add(EncryptedValue::U128(value));
    }

    fn add256(&mut self, value: U256) {
        self.add(EncryptedValue::U256(value));
    }

    fn add_address(&mut self, value: Address) {
        self.add(EncryptedValue::Address(value));
    }
}

/// A decrypted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearValue {
    Bool(bool),
    Uint(U256),
    Address(Address),
}

/// A ciphertext handle and the contract allowed to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleContractPair {
    pub handle: String,
    pub contract_address: Address,
}

/// Everything the KMS needs to re-encrypt handles for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDecryptRequest {
    pub handles: Vec<HandleContractPair>,
    pub private_key: String,
    pub public_key: String,
    pub signature: String,
    pub contract_addresses: Vec<Address>,
    pub user_address: Address,
    pub start_timestamp: u64,
    pub duration_days: u64,
}

/// Result of a public decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicDecryptResult {
    pub clear_values: HashMap<String, ClearValue>,
    pub abi_encoded_clear_values: String,
    pub decryption_proof: String,
}

/// Chain-specific cryptographic instance.
#[async_trait]
pub trait FhevmInstance: Send + Sync {
    fn create_encrypted_input(
        &self,
        contract_address: Address,
        user_address: Address,
    ) -> Box<dyn EncryptedInputBuilder>;

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<HashMap<String, ClearValue>, InstanceError>;

    async fn public_decrypt(&self, handles: Vec<String>) -> Result<PublicDecryptResult, InstanceError>;

    /// Typed data authorizing `public_key` to decrypt for `contract_addresses`.
    ///
    /// `domain.chainId` may come back as a big integer.
    fn create_eip712(
        &self,
        public_key: &str,
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> Result<Eip712Value, InstanceError>;

    /// `None` when the instance cannot generate keypairs.
    fn generate_keypair(&self) -> Option<KeyPair> {
        None
    }
}
