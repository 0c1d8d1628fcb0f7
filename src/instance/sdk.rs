// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relayer SDK object and instance configuration.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::mock::FhevmRelayerMetadata;
use super::{FhevmInstance, InstanceError};
use crate::config::{Chain, ChainKind, ProductionContracts};

/// Members the relayer SDK global must expose to be usable.
pub const REQUIRED_SDK_MEMBERS: [&str; 3] = ["initSDK", "createInstance", "SepoliaConfig"];

/// Configuration handed to [`RelayerSdk::create_instance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceConfig {
    /// Local node with simulated FHE. `metadata` is `None` when the node did
    /// not publish relayer metadata.
    Mock {
        chain_id: u64,
        rpc_url: Url,
        metadata: Option<FhevmRelayerMetadata>,
    },
    /// Chain served by a real relayer and KMS.
    Production {
        chain_id: u64,
        network_url: Url,
        contracts: ProductionContracts,
    },
}

impl InstanceConfig {
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Mock { chain_id, .. } | Self::Production { chain_id, .. } => *chain_id,
        }
    }

    /// Production config for `chain`, overriding the network URL with
    /// `transport` when one is configured.
    pub fn for_production_chain(chain: &Chain, transport: Option<&Url>) -> Option<Self> {
        match &chain.kind {
            ChainKind::Production(contracts) => Some(Self::Production {
                chain_id: chain.id,
                network_url: transport.unwrap_or(&contracts.network_url).clone(),
                contracts: contracts.clone(),
            }),
            ChainKind::Mock { .. } => None,
        }
    }

    /// Replace the network URL of a production config. Mock configs and a
    /// `None` transport are left unchanged.
    pub fn with_network_url(self, transport: Option<&Url>) -> Self {
        match (self, transport) {
            (Self::Production { chain_id, contracts, .. }, Some(url)) => Self::Production {
                chain_id,
                network_url: url.clone(),
                contracts,
            },
            (config, _) => config,
        }
    }
}

/// The relayer SDK entry points (`initSDK`, `createInstance`, `SepoliaConfig`).
#[async_trait]
pub trait RelayerSdk: Send + Sync {
    /// Load the WASM modules backing the SDK.
    async fn init_sdk(&self) -> Result<(), InstanceError>;

    async fn create_instance(
        &self,
        config: InstanceConfig,
    ) -> Result<Arc<dyn FhevmInstance>, InstanceError>;

    /// The SDK's built-in Sepolia configuration.
    fn sepolia_config(&self) -> InstanceConfig;
}

/// The global object a relayer script installs.
///
/// Carries the member names the script actually exported so the loader can
/// reject a malformed build before handing it to the orchestrator.
pub struct RelayerSdkGlobal {
    members: BTreeSet<String>,
    initialized: AtomicBool,
    sdk: Arc<dyn RelayerSdk>,
}

impl RelayerSdkGlobal {
    /// A well-formed global exposing every required member.
    pub fn new(sdk: Arc<dyn RelayerSdk>) -> Self {
        Self::with_members(sdk, REQUIRED_SDK_MEMBERS)
    }

    pub fn with_members<I, S>(sdk: Arc<dyn RelayerSdk>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
            initialized: AtomicBool::new(false),
            sdk,
        }
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    /// First required member the global is missing, if any.
    pub fn missing_member(&self) -> Option<&'static str> {
        REQUIRED_SDK_MEMBERS
            .into_iter()
            .find(|member| !self.has_member(member))
    }

    pub fn is_valid(&self) -> bool {
        self.missing_member().is_none()
    }

    /// The `__initialized__` flag.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    pub fn sdk(&self) -> &Arc<dyn RelayerSdk> {
        &self.sdk
    }
}

impl std::fmt::Debug for RelayerSdkGlobal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayerSdkGlobal")
            .field("members", &self.members)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}
