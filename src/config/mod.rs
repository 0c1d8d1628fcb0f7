// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain registry and runtime settings.
//!
//! [`FhevmConfig`] is built once at startup and is read-only afterwards.

pub mod chains;
pub mod settings;

use std::collections::HashMap;

use url::Url;

pub use chains::{
    hardhat, sepolia, Chain, ChainKind, ProductionContracts, HARDHAT_CHAIN_ID, HARDHAT_RPC_URL,
    SEPOLIA_CHAIN_ID,
};
pub use settings::SdkSettings;

/// Errors raised while building a [`FhevmConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("At least one chain must be configured")]
    NoChains,

    #[error("No transport configured for chain {chain_id}")]
    MissingTransport { chain_id: u64 },
}

/// Immutable chain registry.
#[derive(Debug, Clone)]
pub struct FhevmConfig {
    chains: Vec<Chain>,
    transports: Option<HashMap<u64, Url>>,
}

/// Builder for [`FhevmConfig`].
#[derive(Debug, Default)]
pub struct FhevmConfigBuilder {
    chains: Vec<Chain>,
    transports: Option<HashMap<u64, Url>>,
}

impl FhevmConfigBuilder {
    /// Register a chain. Order matters: the first chain with a given id wins.
    pub fn chain(mut self, chain: Chain) -> Self {
        self.chains.push(chain);
        self
    }

    pub fn chains(mut self, chains: impl IntoIterator<Item = Chain>) -> Self {
        self.chains.extend(chains);
        self
    }

    /// Configure the JSON-RPC transport for a chain.
    ///
    /// Once any transport is configured, every production chain needs one.
    pub fn transport(mut self, chain_id: u64, url: Url) -> Self {
        self.transports
            .get_or_insert_with(HashMap::new)
            .insert(chain_id, url);
        self
    }

    pub fn build(self) -> Result<FhevmConfig, ConfigError> {
        if self.chains.is_empty() {
            return Err(ConfigError::NoChains);
        }

        let mut chains: Vec<Chain> = Vec::with_capacity(self.chains.len());
        for chain in self.chains {
            if chains.iter().any(|existing| existing.id == chain.id) {
                tracing::warn!(
                    chain_id = chain.id,
                    name = %chain.name,
                    "Duplicate chain id in config, keeping the first definition"
                );
                continue;
            }
            chains.push(chain);
        }

        let transports = match self.transports {
            Some(mut transports) => {
                for chain in &chains {
                    if transports.contains_key(&chain.id) {
                        continue;
                    }
                    match chain.rpc_url() {
                        Some(rpc_url) => {
                            transports.insert(chain.id, rpc_url.clone());
                        }
                        None => return Err(ConfigError::MissingTransport { chain_id: chain.id }),
                    }
                }
                Some(transports)
            }
            None => None,
        };

        Ok(FhevmConfig { chains, transports })
    }
}

impl FhevmConfig {
    pub fn builder() -> FhevmConfigBuilder {
        FhevmConfigBuilder::default()
    }

    /// Chains in registration order, duplicates removed.
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn get_chain(&self, chain_id: u64) -> Option<&Chain> {
        self.chains.iter().find(|chain| chain.id == chain_id)
    }

    pub fn is_supported(&self, chain_id: u64) -> bool {
        self.get_chain(chain_id).is_some()
    }

    /// RPC URL of a mock chain, `None` for unknown or production chains.
    pub fn mock_rpc_url(&self, chain_id: u64) -> Option<&Url> {
        self.get_chain(chain_id).and_then(Chain::rpc_url)
    }

    /// Transport for a chain when a transport map was configured.
    pub fn transport(&self, chain_id: u64) -> Option<&Url> {
        self.transports.as_ref()?.get(&chain_id)
    }
}

/// Build a config from a list of chains with no transport map.
pub fn create_fhevm_config(chains: impl IntoIterator<Item = Chain>) -> Result<FhevmConfig, ConfigError> {
    FhevmConfig::builder().chains(chains).build()
}
