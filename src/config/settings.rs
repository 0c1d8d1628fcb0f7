// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the SDK. Settings are loaded from the environment once at
//! startup with [`SdkSettings::from_env`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `FHEVM_RELAYER_SDK_URL` | URL of the relayer SDK script | Zama CDN build |
//! | `FHEVM_INIT_TIMEOUT_MS` | Instance construction timeout | `30000` |
//! | `FHEVM_SCRIPT_MAX_RETRIES` | Script load retries after the first attempt | `3` |
//! | `FHEVM_SCRIPT_INITIAL_DELAY_MS` | First backoff delay | `1000` |
//! | `FHEVM_SCRIPT_MAX_DELAY_MS` | Backoff ceiling | `10000` |
//! | `FHEVM_STORAGE` | Signature storage (`memory`, `session`, `local`, `noop`) | `memory` |
//! | `FHEVM_STORAGE_PATH` | File used by `local` storage | `fhevm-signatures.json` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::relayer::RetryPolicy;
use crate::storage::{create_storage, StorageAdapter, StorageKind, StorageResult};

/// Environment variable name for the relayer SDK script URL.
pub const RELAYER_SDK_URL_ENV: &str = "FHEVM_RELAYER_SDK_URL";

/// Environment variable name for the instance construction timeout.
pub const INIT_TIMEOUT_ENV: &str = "FHEVM_INIT_TIMEOUT_MS";

/// Environment variable name for the script load retry count.
pub const SCRIPT_MAX_RETRIES_ENV: &str = "FHEVM_SCRIPT_MAX_RETRIES";

/// Environment variable name for the first backoff delay.
pub const SCRIPT_INITIAL_DELAY_ENV: &str = "FHEVM_SCRIPT_INITIAL_DELAY_MS";

/// Environment variable name for the backoff ceiling.
pub const SCRIPT_MAX_DELAY_ENV: &str = "FHEVM_SCRIPT_MAX_DELAY_MS";

/// Environment variable name for the signature storage backend.
pub const STORAGE_ENV: &str = "FHEVM_STORAGE";

/// Environment variable name for the `local` storage file.
pub const STORAGE_PATH_ENV: &str = "FHEVM_STORAGE_PATH";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Relayer SDK build loaded when no override is configured.
pub const DEFAULT_RELAYER_SDK_URL: &str =
    "https://cdn.zama.ai/relayer-sdk-js/0.2.0/relayer-sdk-js.umd.cjs";

/// Default instance construction timeout.
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default file for `local` signature storage.
pub const DEFAULT_STORAGE_PATH: &str = "fhevm-signatures.json";

/// Settings resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct SdkSettings {
    pub relayer_sdk_url: String,
    pub init_timeout: Duration,
    pub retry: RetryPolicy,
    pub storage: StorageKind,
    pub storage_path: String,
}

impl Default for SdkSettings {
    fn default() -> Self {
        Self {
            relayer_sdk_url: DEFAULT_RELAYER_SDK_URL.to_string(),
            init_timeout: DEFAULT_INIT_TIMEOUT,
            retry: RetryPolicy::default(),
            storage: StorageKind::Memory,
            storage_path: DEFAULT_STORAGE_PATH.to_string(),
        }
    }
}

impl SdkSettings {
    /// Load settings from the process environment.
    ///
    /// Unset or unparsable variables fall back to their defaults with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let retry = RetryPolicy {
            max_retries: parse_or(&lookup, SCRIPT_MAX_RETRIES_ENV, defaults.retry.max_retries),
            initial_delay: Duration::from_millis(parse_or(
                &lookup,
                SCRIPT_INITIAL_DELAY_ENV,
                defaults.retry.initial_delay.as_millis() as u64,
            )),
            max_delay: Duration::from_millis(parse_or(
                &lookup,
                SCRIPT_MAX_DELAY_ENV,
                defaults.retry.max_delay.as_millis() as u64,
            )),
        };

        Self {
            relayer_sdk_url: lookup(RELAYER_SDK_URL_ENV).unwrap_or(defaults.relayer_sdk_url),
            init_timeout: Duration::from_millis(parse_or(
                &lookup,
                INIT_TIMEOUT_ENV,
                defaults.init_timeout.as_millis() as u64,
            )),
            retry,
            storage: parse_or(&lookup, STORAGE_ENV, defaults.storage),
            storage_path: lookup(STORAGE_PATH_ENV).unwrap_or(defaults.storage_path),
        }
    }

    /// Build the configured signature storage backend.
    pub fn create_storage(&self) -> StorageResult<Arc<dyn StorageAdapter>> {
        create_storage(self.storage, &self.storage_path)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    match lookup(name) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(variable = name, value = %raw, "Ignoring unparsable setting");
                default
            }
        },
        None => default,
    }
}
