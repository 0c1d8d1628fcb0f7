// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! One initialization run: script, SDK init, chain config, instance.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Chain, ChainKind, FhevmConfig};
use crate::instance::mock::MockMetadataSource;
use crate::instance::{FhevmInstance, InstanceConfig, RelayerSdk};
use crate::relayer::ScriptLoader;

use super::InitError;

/// Everything a run needs, cheap to clone into a spawned task.
#[derive(Clone)]
pub(crate) struct Initializer {
    pub config: Arc<FhevmConfig>,
    pub loader: Arc<dyn ScriptLoader>,
    pub metadata: Arc<dyn MockMetadataSource>,
    pub init_timeout: Duration,
}

impl Initializer {
    pub async fn create_instance(&self, chain_id: u64) -> Result<Arc<dyn FhevmInstance>, InitError> {
        let chain = self
            .config
            .get_chain(chain_id)
            .ok_or(InitError::UnsupportedChain(chain_id))?;

        let global = self.loader.load().await?;
        if !global.is_initialized() {
            global.sdk().init_sdk().await?;
            global.mark_initialized();
            tracing::debug!("Relayer SDK initialized");
        }

        let instance_config = self.instance_config(chain, global.sdk().as_ref()).await?;
        tracing::debug!(chain_id, mock = chain.is_mock(), "Creating FHEVM instance");

        // The creation task is detached, not aborted, when the timeout fires.
        let sdk = global.sdk().clone();
        let creation = tokio::spawn(async move { sdk.create_instance(instance_config).await });

        match tokio::time::timeout(self.init_timeout, creation).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(join_error)) => Err(InitError::Task(join_error.to_string())),
            Err(_) => Err(InitError::Timeout(self.init_timeout)),
        }
    }

    async fn instance_config(
        &self,
        chain: &Chain,
        sdk: &dyn RelayerSdk,
    ) -> Result<InstanceConfig, InitError> {
        match &chain.kind {
            ChainKind::Mock { rpc_url } => {
                let rpc_url = self.config.transport(chain.id).unwrap_or(rpc_url).clone();
                let metadata = match self.metadata.fetch(&rpc_url).await {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        tracing::warn!(
                            chain_id = chain.id,
                            rpc_url = %rpc_url,
                            error = %e,
                            "Could not fetch relayer metadata from mock node"
                        );
                        None
                    }
                };
                Ok(InstanceConfig::Mock {
                    chain_id: chain.id,
                    rpc_url,
                    metadata,
                })
            }
            ChainKind::Production(_) => {
                let transport = self.config.transport(chain.id);
                // The SDK's built-in addresses win for the chain it ships a config for
                let builtin = sdk.sepolia_config();
                if builtin.chain_id() == chain.id {
                    return Ok(builtin.with_network_url(transport));
                }
                InstanceConfig::for_production_chain(chain, transport)
                    .ok_or(InitError::UnsupportedChain(chain.id))
            }
        }
    }
}
