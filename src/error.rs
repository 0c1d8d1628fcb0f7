// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Crate-level error type.
//!
//! Each module owns a focused error enum (`ConfigError`, `StorageError`,
//! `ProviderError`, ...). `SdkError` unifies them for callers that drive
//! several modules and just want `?` to work.

use crate::config::ConfigError;
use crate::instance::InstanceError;
use crate::instance::mock::MetadataError;
use crate::orchestrator::InitError;
use crate::provider::ProviderError;
use crate::relayer::ScriptLoadError;
use crate::signature::SignatureError;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    ScriptLoad(#[from] ScriptLoadError),

    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error("FHEVM instance is not ready (status: {0})")]
    NotReady(String),

    #[error("No valid decryption signature: the wallet did not authorize decryption")]
    SignatureUnavailable,
}

pub type SdkResult<T> = Result<T, SdkError>;
