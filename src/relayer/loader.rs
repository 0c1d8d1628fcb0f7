// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Script-tag loader with bounded retries.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{RetryPolicy, ScriptHost, ScriptLoadError, ScriptLoader, ScriptStatus};
use crate::config::SdkSettings;
use crate::instance::RelayerSdkGlobal;

/// Loads the relayer SDK by injecting a `<script>` tag into a [`ScriptHost`].
///
/// Attempts are bounded by [`RetryPolicy::max_attempts`]. A failed tag is
/// removed before the next attempt so a retry always fetches anew. When a tag
/// for the same URL is already present, the loader checks the global it may
/// have installed and otherwise waits on it instead of injecting a duplicate.
pub struct RelayerScriptLoader<H> {
    host: H,
    url: String,
    retry: RetryPolicy,
    status: Mutex<ScriptStatus>,
}

impl<H: ScriptHost> RelayerScriptLoader<H> {
    pub fn new(host: H, url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            host,
            url: url.into(),
            retry,
            status: Mutex::new(ScriptStatus::Idle),
        }
    }

    pub fn from_settings(host: H, settings: &SdkSettings) -> Self {
        Self::new(host, settings.relayer_sdk_url.clone(), settings.retry)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn set_status(&self, status: ScriptStatus) {
        if let Ok(mut current) = self.status.lock() {
            *current = status;
        }
    }

    /// A present global counts only when it is well-shaped.
    fn valid_global(&self) -> Option<Arc<RelayerSdkGlobal>> {
        self.host.relayer_sdk().filter(|global| global.is_valid())
    }

    async fn attempt(&self) -> Result<Arc<RelayerSdkGlobal>, ScriptLoadError> {
        let loaded = if self.host.has_script(&self.url) {
            // A tag that already ran will not fire `load` again
            if let Some(global) = self.host.relayer_sdk() {
                if let Some(member) = global.missing_member() {
                    return Err(ScriptLoadError::InvalidSdk(member));
                }
                return Ok(global);
            }
            tracing::debug!(url = %self.url, "Waiting on existing relayer script tag");
            self.host.wait_for_script(&self.url).await
        } else {
            self.host.inject_script(&self.url).await
        };
        loaded.map_err(ScriptLoadError::ScriptFailed)?;

        let global = self.host.relayer_sdk().ok_or(ScriptLoadError::MissingGlobal)?;
        if let Some(member) = global.missing_member() {
            return Err(ScriptLoadError::InvalidSdk(member));
        }
        Ok(global)
    }
}

#[async_trait]
impl<H: ScriptHost> ScriptLoader for RelayerScriptLoader<H> {
    async fn load(&self) -> Result<Arc<RelayerSdkGlobal>, ScriptLoadError> {
        if !self.host.is_browser() {
            self.set_status(ScriptStatus::Error);
            return Err(ScriptLoadError::BrowserOnly);
        }

        if let Some(global) = self.valid_global() {
            self.set_status(ScriptStatus::Ready);
            return Ok(global);
        }

        self.set_status(ScriptStatus::Loading);
        let attempts = self.retry.max_attempts();
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.retry.calculate_backoff(attempt - 1);
                tracing::debug!(
                    url = %self.url,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying relayer script load"
                );
                tokio::time::sleep(delay).await;
            }

            match self.attempt().await {
                Ok(global) => {
                    tracing::info!(url = %self.url, attempt = attempt + 1, "Relayer SDK loaded");
                    self.set_status(ScriptStatus::Ready);
                    return Ok(global);
                }
                Err(e) => {
                    tracing::warn!(
                        url = %self.url,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        error = %e,
                        "Relayer script load attempt failed"
                    );
                    self.host.remove_script(&self.url);
                    last_error = Some(e);
                }
            }
        }

        self.set_status(ScriptStatus::Error);
        let last_error = last_error.map(|e| e.to_string()).unwrap_or_default();
        tracing::error!(url = %self.url, attempts, error = %last_error, "Relayer SDK unavailable");
        Err(ScriptLoadError::RetriesExhausted {
            attempts,
            last_error,
        })
    }

    fn status(&self) -> ScriptStatus {
        self.status
            .lock()
            .map(|status| *status)
            .unwrap_or(ScriptStatus::Error)
    }
}
