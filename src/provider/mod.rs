// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-1193 wallet provider boundary.
//!
//! The SDK only ever talks to a wallet through [`Eip1193Provider::request`].
//! The helpers in this module wrap the handful of methods it needs:
//! - `eth_signTypedData_v4` for decryption authorizations
//! - `eth_chainId` for chain detection
//! - `eth_accounts` / `eth_requestAccounts` for the connected user

pub mod http;
pub mod local;

use std::str::FromStr;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub use http::HttpProvider;
pub use local::LocalSignerProvider;

/// EIP-1193 error code for a request the user rejected.
pub const USER_REJECTED_CODE: i64 = 4001;

/// EIP-1193 error code for a method the provider does not support.
pub const UNSUPPORTED_METHOD_CODE: i64 = 4200;

/// Arguments of a single `request` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestArguments {
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

impl RequestArguments {
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// Errors returned by providers and the helpers below.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("User rejected the request")]
    UserRejected,

    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("Provider RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

impl ProviderError {
    /// Map an EIP-1193 `{ code, message }` error.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        match code {
            USER_REJECTED_CODE => Self::UserRejected,
            UNSUPPORTED_METHOD_CODE => Self::UnsupportedMethod(message.into()),
            _ => Self::Rpc {
                code,
                message: message.into(),
            },
        }
    }
}

/// Minimal EIP-1193 provider.
#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    async fn request(&self, args: RequestArguments) -> Result<Value, ProviderError>;
}

/// Sign EIP-712 typed data with `eth_signTypedData_v4`.
///
/// Returns the `0x`-prefixed signature produced by the wallet.
pub async fn sign_typed_data(
    provider: &dyn Eip1193Provider,
    signer: Address,
    typed_data: &Value,
) -> Result<String, ProviderError> {
    let payload = serde_json::to_string(typed_data)
        .map_err(|e| ProviderError::Signing(format!("typed data is not serializable: {e}")))?;

    let response = provider
        .request(RequestArguments::new(
            "eth_signTypedData_v4",
            vec![json!(signer.to_string().to_lowercase()), json!(payload)],
        ))
        .await?;

    match response {
        Value::String(signature) if signature.starts_with("0x") => Ok(signature),
        other => Err(ProviderError::InvalidResponse(format!(
            "expected hex signature, got {other}"
        ))),
    }
}

/// Current chain id via `eth_chainId`.
pub async fn get_chain_id(provider: &dyn Eip1193Provider) -> Result<u64, ProviderError> {
    let response = provider
        .request(RequestArguments::new("eth_chainId", Vec::new()))
        .await?;
    parse_quantity(&response)
}

/// Accounts already exposed to the dapp via `eth_accounts`.
pub async fn get_accounts(provider: &dyn Eip1193Provider) -> Result<Vec<Address>, ProviderError> {
    let response = provider
        .request(RequestArguments::new("eth_accounts", Vec::new()))
        .await?;
    parse_accounts(&response)
}

/// Ask the wallet to connect via `eth_requestAccounts`.
pub async fn request_accounts(provider: &dyn Eip1193Provider) -> Result<Vec<Address>, ProviderError> {
    let response = provider
        .request(RequestArguments::new("eth_requestAccounts", Vec::new()))
        .await?;
    parse_accounts(&response)
}

/// Parse a JSON-RPC quantity (`"0x..."` hex string, decimal string or number).
pub fn parse_quantity(value: &Value) -> Result<u64, ProviderError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => s.parse().ok(),
        },
        _ => None,
    };
    parsed.ok_or_else(|| ProviderError::InvalidResponse(format!("invalid quantity: {value}")))
}

fn parse_accounts(value: &Value) -> Result<Vec<Address>, ProviderError> {
    let list = value
        .as_array()
        .ok_or_else(|| ProviderError::InvalidResponse(format!("expected account list, got {value}")))?;

    list.iter()
        .map(|entry| {
            entry
                .as_str()
                .and_then(|s| Address::from_str(s).ok())
                .ok_or_else(|| ProviderError::InvalidResponse(format!("invalid account: {entry}")))
        })
        .collect()
}
