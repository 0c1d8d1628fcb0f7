// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Instance Orchestrator
//!
//! Drives the FHEVM instance through its lifecycle and publishes the result
//! on a `tokio::sync::watch` channel:
//!
//! ```text
//! Idle ──start──▶ Initializing ──▶ Ready
//!   ▲                   │
//!   │                   └────────▶ Error
//!   └── inputs unavailable / dispose
//! ```
//!
//! Each run gets a generation number. Only the run whose generation is
//! current may publish its outcome, so a result arriving after the inputs
//! changed (or after the init timeout fired) is dropped.
//!
//! ## Shutdown
//!
//! [`FhevmOrchestrator::dispose`] cancels in-flight runs through a
//! `tokio_util::sync::CancellationToken` and returns the state to `Idle`.

mod init;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::settings::DEFAULT_INIT_TIMEOUT;
use crate::config::{FhevmConfig, SdkSettings};
use crate::error::{SdkError, SdkResult};
use crate::instance::mock::{MockMetadataSource, RpcMetadataClient};
use crate::instance::{FhevmInstance, InstanceError};
use crate::provider::Eip1193Provider;
use crate::relayer::{ScriptLoadError, ScriptLoader};

use init::Initializer;

/// Lifecycle state of the FHEVM instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstanceStatus {
    #[default]
    Idle,
    Initializing,
    Ready,
    Error,
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Snapshot published to subscribers.
#[derive(Clone, Default)]
pub struct InstanceState {
    pub status: InstanceStatus,
    pub chain_id: Option<u64>,
    /// Set only when `status` is `Ready`
    pub instance: Option<Arc<dyn FhevmInstance>>,
    /// Set only when `status` is `Error`
    pub error: Option<String>,
}

impl InstanceState {
    fn initializing(chain_id: u64) -> Self {
        Self {
            status: InstanceStatus::Initializing,
            chain_id: Some(chain_id),
            ..Default::default()
        }
    }

    fn ready(chain_id: u64, instance: Arc<dyn FhevmInstance>) -> Self {
        Self {
            status: InstanceStatus::Ready,
            chain_id: Some(chain_id),
            instance: Some(instance),
            error: None,
        }
    }

    fn failed(chain_id: u64, error: String) -> Self {
        Self {
            status: InstanceStatus::Error,
            chain_id: Some(chain_id),
            instance: None,
            error: Some(error),
        }
    }
}

impl std::fmt::Debug for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceState")
            .field("status", &self.status)
            .field("chain_id", &self.chain_id)
            .field("instance", &self.instance.is_some())
            .field("error", &self.error)
            .finish()
    }
}

/// Wallet connection the orchestrator builds against.
#[derive(Clone, Default)]
pub struct ConnectionInputs {
    pub provider: Option<Arc<dyn Eip1193Provider>>,
    pub chain_id: Option<u64>,
    pub is_connected: bool,
}

impl ConnectionInputs {
    pub fn connected(provider: Arc<dyn Eip1193Provider>, chain_id: u64) -> Self {
        Self {
            provider: Some(provider),
            chain_id: Some(chain_id),
            is_connected: true,
        }
    }

    /// Chain id when every input needed for a run is present.
    fn usable_chain(&self) -> Option<u64> {
        match (&self.provider, self.chain_id, self.is_connected) {
            (Some(_), Some(chain_id), true) => Some(chain_id),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ConnectionInputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionInputs")
            .field("provider", &self.provider.is_some())
            .field("chain_id", &self.chain_id)
            .field("is_connected", &self.is_connected)
            .finish()
    }
}

/// Failure of an initialization run.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Chain {0} is not supported by the FHEVM configuration")]
    UnsupportedChain(u64),

    #[error(transparent)]
    Script(#[from] ScriptLoadError),

    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error("FHEVM instance creation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Instance creation task failed: {0}")]
    Task(String),
}

/// State shared with spawned runs.
struct Shared {
    state: watch::Sender<InstanceState>,
    generation: AtomicU64,
}

impl Shared {
    /// Publish `state` if `generation` is still the current run.
    fn publish(&self, generation: u64, state: InstanceState) -> bool {
        self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *current = state;
            true
        })
    }

    /// Start a new generation and publish its first state atomically.
    fn advance(&self, state: InstanceState) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|current| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *current = state;
        });
        generation
    }
}

/// Owns the instance lifecycle for one wallet connection at a time.
pub struct FhevmOrchestrator {
    initializer: Initializer,
    inputs: Mutex<ConnectionInputs>,
    shared: Arc<Shared>,
    shutdown: CancellationToken,
}

impl FhevmOrchestrator {
    pub fn new(config: FhevmConfig, loader: Arc<dyn ScriptLoader>) -> Self {
        let (state, _) = watch::channel(InstanceState::default());
        Self {
            initializer: Initializer {
                config: Arc::new(config),
                loader,
                metadata: Arc::new(RpcMetadataClient),
                init_timeout: DEFAULT_INIT_TIMEOUT,
            },
            inputs: Mutex::new(ConnectionInputs::default()),
            shared: Arc::new(Shared {
                state,
                generation: AtomicU64::new(0),
            }),
            shutdown: CancellationToken::new(),
        }
    }

    /// Build an orchestrator using the construction timeout from `settings`.
    pub fn from_settings(
        config: FhevmConfig,
        loader: Arc<dyn ScriptLoader>,
        settings: &SdkSettings,
    ) -> Self {
        Self::new(config, loader).with_init_timeout(settings.init_timeout)
    }

    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.initializer.init_timeout = timeout;
        self
    }

    /// Replace the mock-node metadata source (defaults to JSON-RPC).
    pub fn with_metadata_source(mut self, metadata: Arc<dyn MockMetadataSource>) -> Self {
        self.initializer.metadata = metadata;
        self
    }

    pub fn config(&self) -> &FhevmConfig {
        &self.initializer.config
    }

    /// Replace the connection inputs and restart from them.
    pub fn set_inputs(&self, inputs: ConnectionInputs) {
        debug!(inputs = ?inputs, "Connection inputs changed");
        match self.inputs.lock() {
            Ok(mut current) => *current = inputs,
            Err(_) => {
                error!("Orchestrator inputs lock poisoned");
                return;
            }
        }
        self.start();
    }

    /// Begin a run from the current inputs.
    ///
    /// Without a provider, chain id and live connection the state returns to
    /// `Idle`. Must be called within a tokio runtime.
    pub fn start(&self) {
        if self.shutdown.is_cancelled() {
            debug!("Orchestrator disposed, ignoring start");
            return;
        }

        let chain_id = self
            .inputs
            .lock()
            .ok()
            .and_then(|inputs| inputs.usable_chain());

        let Some(chain_id) = chain_id else {
            self.shared.advance(InstanceState::default());
            debug!("Connection unavailable, instance idle");
            return;
        };

        let generation = self.shared.advance(InstanceState::initializing(chain_id));
        info!(chain_id, generation, "Initializing FHEVM instance");

        let initializer = self.initializer.clone();
        let shared = self.shared.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = shutdown.cancelled() => return,
                outcome = initializer.create_instance(chain_id) => outcome,
            };

            let (state, result) = match outcome {
                Ok(instance) => (InstanceState::ready(chain_id, instance), Ok(())),
                Err(e) => (InstanceState::failed(chain_id, e.to_string()), Err(e)),
            };

            if !shared.publish(generation, state) {
                debug!(chain_id, generation, "Discarding stale initialization result");
                return;
            }

            match result {
                Ok(()) => info!(chain_id, generation, "FHEVM instance ready"),
                Err(e) => error!(chain_id, generation, error = %e, "FHEVM instance initialization failed"),
            }
        });
    }

    /// Force a full re-attempt from the current inputs.
    pub fn refresh(&self) {
        info!("Refreshing FHEVM instance");
        self.start();
    }

    /// Cancel pending runs and return to `Idle`. Later `start` calls are ignored.
    pub fn dispose(&self) {
        self.shutdown.cancel();
        self.shared.advance(InstanceState::default());
        info!("FHEVM orchestrator disposed");
    }

    pub fn state(&self) -> InstanceState {
        self.shared.state.borrow().clone()
    }

    pub fn status(&self) -> InstanceStatus {
        self.shared.state.borrow().status
    }

    pub fn instance(&self) -> Option<Arc<dyn FhevmInstance>> {
        self.shared.state.borrow().instance.clone()
    }

    /// The instance, or [`SdkError::NotReady`] with the current status.
    pub fn ready_instance(&self) -> SdkResult<Arc<dyn FhevmInstance>> {
        let state = self.shared.state.borrow();
        match (&state.status, &state.instance) {
            (InstanceStatus::Ready, Some(instance)) => Ok(instance.clone()),
            (status, _) => Err(SdkError::NotReady(status.to_string())),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<InstanceState> {
        self.shared.state.subscribe()
    }

    /// Wait until the state leaves `Initializing`.
    pub async fn wait_until_settled(&self) -> InstanceState {
        let mut receiver = self.subscribe();
        let settled = receiver
            .wait_for(|state| state.status != InstanceStatus::Initializing)
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| self.state())
    }
}

impl Drop for FhevmOrchestrator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{hardhat, sepolia, SEPOLIA_CHAIN_ID};
    use crate::instance::mock::tests::StaticMetadata;
    use crate::instance::mock::FhevmRelayerMetadata;
    use crate::instance::sdk::tests::{FakeSdk, BUILTIN_RELAYER_URL};
    use crate::instance::{InstanceConfig, RelayerSdk, RelayerSdkGlobal};
    use crate::provider::tests::ScriptedProvider;
    use crate::relayer::PreloadedSdk;
    use alloy::primitives::address;
    use std::sync::atomic::Ordering;
    use url::Url;

    fn provider() -> Arc<dyn Eip1193Provider> {
        Arc::new(ScriptedProvider::default())
    }

    fn config() -> FhevmConfig {
        FhevmConfig::builder().chain(sepolia()).chain(hardhat()).build().unwrap()
    }

    fn orchestrator_with(sdk: Arc<FakeSdk>) -> (FhevmOrchestrator, Arc<RelayerSdkGlobal>) {
        let global = Arc::new(RelayerSdkGlobal::new(sdk as Arc<dyn RelayerSdk>));
        let loader = Arc::new(PreloadedSdk::new(global.clone()));
        let orchestrator = FhevmOrchestrator::new(config(), loader)
            .with_metadata_source(Arc::new(StaticMetadata::default()));
        (orchestrator, global)
    }

    #[tokio::test]
    async fn connected_production_chain_becomes_ready() {
        let sdk = Arc::new(FakeSdk::default());
        let (orchestrator, global) = orchestrator_with(sdk.clone());
        assert_eq!(orchestrator.status(), InstanceStatus::Idle);

        orchestrator.set_inputs(ConnectionInputs::connected(provider(), SEPOLIA_CHAIN_ID));
        assert_eq!(orchestrator.status(), InstanceStatus::Initializing);

        let state = orchestrator.wait_until_settled().await;
        assert_eq!(state.status, InstanceStatus::Ready);
        assert_eq!(state.chain_id, Some(SEPOLIA_CHAIN_ID));
        assert!(state.error.is_none());
        assert!(orchestrator.ready_instance().is_ok());

        assert!(global.is_initialized());
        assert_eq!(sdk.init_calls.load(Ordering::SeqCst), 1);
        let configs = sdk.configs.lock().unwrap();
        assert!(matches!(
            configs.as_slice(),
            [InstanceConfig::Production { chain_id: SEPOLIA_CHAIN_ID, .. }]
        ));
    }

    #[tokio::test]
    async fn sepolia_uses_builtin_sdk_config_with_transport() {
        let sdk = Arc::new(FakeSdk::default());
        let global = Arc::new(RelayerSdkGlobal::new(sdk.clone() as Arc<dyn RelayerSdk>));
        let rpc = Url::parse("https://rpc.sepolia.example").unwrap();
        let mut other = sepolia();
        other.id = 9_000;
        other.name = "Other".to_string();
        let config = FhevmConfig::builder()
            .chain(sepolia())
            .chain(other)
            .transport(SEPOLIA_CHAIN_ID, rpc.clone())
            .transport(9_000, rpc.clone())
            .build()
            .unwrap();
        let orchestrator = FhevmOrchestrator::new(config, Arc::new(PreloadedSdk::new(global)));

        orchestrator.set_inputs(ConnectionInputs::connected(provider(), SEPOLIA_CHAIN_ID));
        assert_eq!(orchestrator.wait_until_settled().await.status, InstanceStatus::Ready);
        orchestrator.set_inputs(ConnectionInputs::connected(provider(), 9_000));
        assert_eq!(orchestrator.wait_until_settled().await.status, InstanceStatus::Ready);

        let configs = sdk.configs.lock().unwrap();
        match configs.as_slice() {
            [InstanceConfig::Production {
                chain_id: SEPOLIA_CHAIN_ID,
                network_url,
                contracts,
            }, InstanceConfig::Production {
                chain_id: 9_000,
                contracts: registered,
                ..
            }] => {
                assert_eq!(network_url, &rpc);
                assert_eq!(contracts.relayer_url.as_str(), BUILTIN_RELAYER_URL);
                assert_ne!(registered.relayer_url.as_str(), BUILTIN_RELAYER_URL);
            }
            other => panic!("unexpected configs {other:?}"),
        }
    }

    #[tokio::test]
    async fn mock_chain_uses_node_metadata() {
        let sdk = Arc::new(FakeSdk::default());
        let metadata = FhevmRelayerMetadata {
            acl_address: address!("50157CFfD6bBFA2DECe204a89ec419c23ef5755D"),
            input_verifier_address: address!("901F8942346f7AB3a01F6D7613119Bca447Bb030"),
            kms_verifier_address: address!("1364cBBf2cDF5032C47d8226a6f6FBD2AFCDacAC"),
        };
        let source = Arc::new(StaticMetadata {
            metadata: Some(metadata.clone()),
            ..Default::default()
        });
        let global = Arc::new(RelayerSdkGlobal::new(sdk.clone() as Arc<dyn RelayerSdk>));
        let orchestrator = FhevmOrchestrator::new(config(), Arc::new(PreloadedSdk::new(global)))
            .with_metadata_source(source.clone());

        let chain = hardhat();
        orchestrator.set_inputs(ConnectionInputs::connected(provider(), chain.id));
        assert_eq!(orchestrator.wait_until_settled().await.status, InstanceStatus::Ready);

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        let configs = sdk.configs.lock().unwrap();
        assert_eq!(
            configs[0],
            InstanceConfig::Mock {
                chain_id: chain.id,
                rpc_url: chain.rpc_url().unwrap().clone(),
                metadata: Some(metadata),
            }
        );
    }

    #[tokio::test]
    async fn unsupported_chain_is_an_error() {
        let sdk = Arc::new(FakeSdk::default());
        let (orchestrator, _) = orchestrator_with(sdk.clone());

        orchestrator.set_inputs(ConnectionInputs::connected(provider(), 1));
        let state = orchestrator.wait_until_settled().await;

        assert_eq!(state.status, InstanceStatus::Error);
        assert!(state.error.unwrap().contains("Chain 1"));
        assert!(state.instance.is_none());
        assert_eq!(sdk.create_calls.load(Ordering::SeqCst), 0);
        assert!(matches!(
            orchestrator.ready_instance(),
            Err(SdkError::NotReady(status)) if status == "error"
        ));
    }

    #[tokio::test]
    async fn creation_failure_is_an_error() {
        let sdk = Arc::new(FakeSdk {
            fail_create: true,
            ..Default::default()
        });
        let (orchestrator, _) = orchestrator_with(sdk);

        orchestrator.set_inputs(ConnectionInputs::connected(provider(), SEPOLIA_CHAIN_ID));
        let state = orchestrator.wait_until_settled().await;

        assert_eq!(state.status, InstanceStatus::Error);
        assert!(state.error.unwrap().contains("relayer unreachable"));
    }

    #[tokio::test]
    async fn malformed_sdk_surfaces_script_error() {
        let sdk: Arc<dyn RelayerSdk> = Arc::new(FakeSdk::default());
        let global = Arc::new(RelayerSdkGlobal::with_members(sdk, ["initSDK"]));
        let orchestrator = FhevmOrchestrator::new(config(), Arc::new(PreloadedSdk::new(global)));

        orchestrator.set_inputs(ConnectionInputs::connected(provider(), SEPOLIA_CHAIN_ID));
        let state = orchestrator.wait_until_settled().await;

        assert_eq!(state.status, InstanceStatus::Error);
        assert!(state.error.unwrap().contains("Invalid relayerSDK"));
    }

    #[tokio::test]
    async fn disconnect_returns_to_idle() {
        let (orchestrator, _) = orchestrator_with(Arc::new(FakeSdk::default()));

        orchestrator.set_inputs(ConnectionInputs::connected(provider(), SEPOLIA_CHAIN_ID));
        assert_eq!(orchestrator.wait_until_settled().await.status, InstanceStatus::Ready);

        orchestrator.set_inputs(ConnectionInputs {
            is_connected: false,
            ..ConnectionInputs::connected(provider(), SEPOLIA_CHAIN_ID)
        });
        let state = orchestrator.state();
        assert_eq!(state.status, InstanceStatus::Idle);
        assert!(state.instance.is_none());
        assert!(orchestrator.instance().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_errors_and_late_instance_is_discarded() {
        let sdk = Arc::new(FakeSdk {
            create_delay: Some(Duration::from_secs(60)),
            ..Default::default()
        });
        let (orchestrator, _) = orchestrator_with(sdk.clone());
        let orchestrator = orchestrator.with_init_timeout(Duration::from_secs(5));

        orchestrator.set_inputs(ConnectionInputs::connected(provider(), SEPOLIA_CHAIN_ID));
        let state = orchestrator.wait_until_settled().await;
        assert_eq!(state.status, InstanceStatus::Error);
        assert!(state.error.unwrap().contains("timed out after 5000ms"));

        // Let the detached creation task finish
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(sdk.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(orchestrator.status(), InstanceStatus::Error);
        assert!(orchestrator.instance().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn settings_timeout_bounds_creation() {
        let sdk = Arc::new(FakeSdk {
            create_delay: Some(Duration::from_secs(60)),
            ..Default::default()
        });
        let global = Arc::new(RelayerSdkGlobal::new(sdk as Arc<dyn RelayerSdk>));
        let settings = SdkSettings {
            init_timeout: Duration::from_millis(2_500),
            ..SdkSettings::default()
        };
        let orchestrator =
            FhevmOrchestrator::from_settings(config(), Arc::new(PreloadedSdk::new(global)), &settings);

        let start = tokio::time::Instant::now();
        orchestrator.set_inputs(ConnectionInputs::connected(provider(), SEPOLIA_CHAIN_ID));
        let state = orchestrator.wait_until_settled().await;

        assert_eq!(state.status, InstanceStatus::Error);
        assert!(state.error.unwrap().contains("timed out after 2500ms"));
        assert!(start.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_run_does_not_publish() {
        let sdk = Arc::new(FakeSdk {
            create_delay: Some(Duration::from_secs(1)),
            ..Default::default()
        });
        let (orchestrator, _) = orchestrator_with(sdk);

        orchestrator.set_inputs(ConnectionInputs::connected(provider(), SEPOLIA_CHAIN_ID));
        orchestrator.set_inputs(ConnectionInputs::default());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(orchestrator.status(), InstanceStatus::Idle);
        assert!(orchestrator.instance().is_none());
    }

    #[tokio::test]
    async fn refresh_reruns_initialization() {
        let sdk = Arc::new(FakeSdk::default());
        let (orchestrator, _) = orchestrator_with(sdk.clone());

        orchestrator.set_inputs(ConnectionInputs::connected(provider(), SEPOLIA_CHAIN_ID));
        orchestrator.wait_until_settled().await;
        let first = orchestrator.instance().unwrap();

        orchestrator.refresh();
        assert_eq!(orchestrator.status(), InstanceStatus::Initializing);
        let state = orchestrator.wait_until_settled().await;

        assert_eq!(state.status, InstanceStatus::Ready);
        assert!(!Arc::ptr_eq(&first, &state.instance.unwrap()));
        assert_eq!(sdk.create_calls.load(Ordering::SeqCst), 2);
        // The SDK global stays initialized across runs
        assert_eq!(sdk.init_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dispose_returns_to_idle_and_ignores_restarts() {
        let (orchestrator, _) = orchestrator_with(Arc::new(FakeSdk::default()));

        orchestrator.set_inputs(ConnectionInputs::connected(provider(), SEPOLIA_CHAIN_ID));
        orchestrator.wait_until_settled().await;

        orchestrator.dispose();
        assert_eq!(orchestrator.status(), InstanceStatus::Idle);

        orchestrator.refresh();
        assert_eq!(orchestrator.status(), InstanceStatus::Idle);
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let (orchestrator, _) = orchestrator_with(Arc::new(FakeSdk::default()));
        let mut receiver = orchestrator.subscribe();

        orchestrator.set_inputs(ConnectionInputs::connected(provider(), SEPOLIA_CHAIN_ID));
        let ready = receiver
            .wait_for(|state| state.status == InstanceStatus::Ready)
            .await
            .unwrap()
            .clone();
        assert_eq!(ready.chain_id, Some(SEPOLIA_CHAIN_ID));
    }
}
