// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relayer metadata published by a local FHEVM mock node.
//!
//! A Hardhat node running the FHEVM plugin answers `fhevm_relayer_metadata`
//! with the addresses of its mock ACL, input verifier and KMS verifier.
//! Other local nodes (e.g. anvil) don't, in which case the mock instance is
//! built without metadata.

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::provider::{Eip1193Provider, HttpProvider, ProviderError, RequestArguments};

/// Errors raised while querying a mock node.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Mock node RPC failed: {0}")]
    Rpc(#[from] ProviderError),

    #[error("Invalid relayer metadata: {0}")]
    Invalid(String),
}

/// Contract addresses of the mock FHEVM stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FhevmRelayerMetadata {
    #[serde(rename = "ACLAddress")]
    pub acl_address: Address,
    #[serde(rename = "InputVerifierAddress")]
    pub input_verifier_address: Address,
    #[serde(rename = "KMSVerifierAddress")]
    pub kms_verifier_address: Address,
}

/// Source of mock-node metadata.
#[async_trait]
pub trait MockMetadataSource: Send + Sync {
    /// `Ok(None)` when the node is not an FHEVM Hardhat node.
    async fn fetch(&self, rpc_url: &Url) -> Result<Option<FhevmRelayerMetadata>, MetadataError>;
}

/// Queries the node's JSON-RPC endpoint directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpcMetadataClient;

#[async_trait]
impl MockMetadataSource for RpcMetadataClient {
    async fn fetch(&self, rpc_url: &Url) -> Result<Option<FhevmRelayerMetadata>, MetadataError> {
        let provider = HttpProvider::new(rpc_url.clone())?;
        fetch_with_provider(&provider).await
    }
}

/// Detect a Hardhat node and read its relayer metadata.
pub async fn fetch_with_provider(
    provider: &dyn Eip1193Provider,
) -> Result<Option<FhevmRelayerMetadata>, MetadataError> {
    let version = provider
        .request(RequestArguments::new("web3_clientVersion", Vec::new()))
        .await?;

    let is_hardhat = version
        .as_str()
        .map(|v| v.to_ascii_lowercase().contains("hardhat"))
        .unwrap_or(false);

    if !is_hardhat {
        tracing::debug!(client_version = %version, "Node is not Hardhat, skipping relayer metadata");
        return Ok(None);
    }

    let metadata = provider
        .request(RequestArguments::new("fhevm_relayer_metadata", Vec::new()))
        .await?;

    parse_metadata(metadata).map(Some)
}

fn parse_metadata(value: Value) -> Result<FhevmRelayerMetadata, MetadataError> {
    serde_json::from_value(value).map_err(|e| MetadataError::Invalid(e.to_string()))
}
