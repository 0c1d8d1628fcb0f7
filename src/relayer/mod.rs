// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relayer SDK loading.
//!
//! In a browser the SDK is a third-party `<script>` that installs a global
//! object; [`RelayerScriptLoader`] injects it with retry and backoff. Native
//! builds link the SDK in and use [`PreloadedSdk`].

pub mod backoff;
pub mod host;
pub mod loader;

use std::sync::Arc;

use async_trait::async_trait;

use crate::instance::RelayerSdkGlobal;

pub use backoff::RetryPolicy;
pub use host::{HeadlessHost, ScriptHost};
pub use loader::RelayerScriptLoader;

/// Script loader state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

impl std::fmt::Display for ScriptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptLoadError {
    #[error("Relayer SDK script can only be loaded in a browser")]
    BrowserOnly,

    #[error("Failed to load relayer SDK script: {0}")]
    ScriptFailed(String),

    #[error("Relayer SDK script loaded but no relayerSDK global was installed")]
    MissingGlobal,

    #[error("Invalid relayerSDK object: missing {0}")]
    InvalidSdk(&'static str),

    #[error("Relayer SDK failed to load after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

/// Source of the relayer SDK global.
#[async_trait]
pub trait ScriptLoader: Send + Sync {
    /// Resolve the SDK global, loading it if needed.
    async fn load(&self) -> Result<Arc<RelayerSdkGlobal>, ScriptLoadError>;

    fn status(&self) -> ScriptStatus;
}

/// Loader for an SDK linked into the process.
#[derive(Debug, Clone)]
pub struct PreloadedSdk {
    global: Arc<RelayerSdkGlobal>,
}

impl PreloadedSdk {
    pub fn new(global: Arc<RelayerSdkGlobal>) -> Self {
        Self { global }
    }
}

#[async_trait]
impl ScriptLoader for PreloadedSdk {
    async fn load(&self) -> Result<Arc<RelayerSdkGlobal>, ScriptLoadError> {
        if let Some(member) = self.global.missing_member() {
            return Err(ScriptLoadError::InvalidSdk(member));
        }
        Ok(self.global.clone())
    }

    fn status(&self) -> ScriptStatus {
        if self.global.is_valid() {
            ScriptStatus::Ready
        } else {
            ScriptStatus::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::sdk::tests::FakeSdk;

    #[tokio::test]
    async fn preloaded_sdk_is_ready_immediately() {
        let global = Arc::new(RelayerSdkGlobal::new(Arc::new(FakeSdk::default())));
        let loader = PreloadedSdk::new(global.clone());

        assert_eq!(loader.status(), ScriptStatus::Ready);
        assert!(Arc::ptr_eq(&loader.load().await.unwrap(), &global));
    }

    #[tokio::test]
    async fn preloaded_sdk_rejects_malformed_global() {
        let global = RelayerSdkGlobal::with_members(Arc::new(FakeSdk::default()), ["initSDK"]);
        let loader = PreloadedSdk::new(Arc::new(global));

        assert_eq!(loader.status(), ScriptStatus::Error);
        assert_eq!(
            loader.load().await.unwrap_err(),
            ScriptLoadError::InvalidSdk("createInstance")
        );
    }
}
