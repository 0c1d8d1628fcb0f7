// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON-RPC over HTTP exposed as an EIP-1193 provider.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::{Eip1193Provider, ProviderError, RequestArguments};

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

/// Read-only provider for a node's JSON-RPC endpoint.
#[derive(Debug)]
pub struct HttpProvider {
    url: Url,
    http: Client,
    next_id: AtomicU64,
}

impl HttpProvider {
    pub fn new(url: Url) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Eip1193Provider for HttpProvider {
    async fn request(&self, args: RequestArguments) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": args.method,
            "params": args.params,
        });

        let response = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Transport(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        decode_response(parsed)
    }
}

fn decode_response(response: RpcResponse) -> Result<Value, ProviderError> {
    if let Some(error) = response.error {
        return Err(ProviderError::from_rpc(error.code, error.message));
    }
    Ok(response.result.unwrap_or(Value::Null))
}
