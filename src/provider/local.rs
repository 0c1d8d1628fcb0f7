// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-1193 provider backed by a local private key.
//!
//! Answers account, chain and typed-data signing requests itself and
//! forwards every other method to an optional JSON-RPC transport. Useful for
//! scripts, tests and headless agents that have no browser wallet.

use alloy::dyn_abi::TypedData;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Eip1193Provider, HttpProvider, ProviderError, RequestArguments};

/// Wallet provider holding a secp256k1 key in process.
pub struct LocalSignerProvider {
    signer: PrivateKeySigner,
    chain_id: u64,
    transport: Option<HttpProvider>,
}

impl LocalSignerProvider {
    pub fn new(signer: PrivateKeySigner, chain_id: u64) -> Self {
        Self {
            signer,
            chain_id,
            transport: None,
        }
    }

    /// Create a provider from a private key (hex string, with or without 0x prefix).
    pub fn from_hex(private_key_hex: &str, chain_id: u64) -> Result<Self, ProviderError> {
        let key_bytes = alloy::hex::decode(private_key_hex)
            .map_err(|e| ProviderError::Signing(format!("invalid private key: {e}")))?;

        let signer = PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| ProviderError::Signing(format!("invalid private key: {e}")))?;

        Ok(Self::new(signer, chain_id))
    }

    /// Forward methods this provider does not answer itself.
    pub fn with_transport(mut self, transport: HttpProvider) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn sign_typed_data_v4(&self, params: &[Value]) -> Result<Value, ProviderError> {
        let requested = params
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Signing("missing signer address".to_string()))?;

        let requested: Address = requested
            .parse()
            .map_err(|e| ProviderError::Signing(format!("invalid signer address: {e}")))?;

        if requested != self.signer.address() {
            return Err(ProviderError::Signing(format!(
                "address {requested} is not managed by this provider"
            )));
        }

        // Wallets accept the payload either as a JSON string or an object
        let typed_data: TypedData = match params.get(1) {
            Some(Value::String(raw)) => serde_json::from_str(raw),
            Some(value) => serde_json::from_value(value.clone()),
            None => return Err(ProviderError::Signing("missing typed data".to_string())),
        }
        .map_err(|e| ProviderError::Signing(format!("invalid typed data: {e}")))?;

        let signature = self
            .signer
            .sign_dynamic_typed_data(&typed_data)
            .await
            .map_err(|e| ProviderError::Signing(e.to_string()))?;

        Ok(json!(alloy::hex::encode_prefixed(signature.as_bytes())))
    }
}

#[async_trait]
impl Eip1193Provider for LocalSignerProvider {
    async fn request(&self, args: RequestArguments) -> Result<Value, ProviderError> {
        match args.method.as_str() {
            "eth_chainId" => Ok(json!(format!("0x{:x}", self.chain_id))),
            "eth_accounts" | "eth_requestAccounts" => {
                Ok(json!([self.signer.address().to_string()]))
            }
            "eth_signTypedData_v4" => self.sign_typed_data_v4(&args.params).await,
            _ => match &self.transport {
                Some(transport) => transport.request(args).await,
                None => Err(ProviderError::UnsupportedMethod(args.method)),
            },
        }
    }
}
