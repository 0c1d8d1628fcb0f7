// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Signature Storage
//!
//! Pluggable string key-value stores used to cache decryption signatures.
//!
//! | Backend | Lifetime |
//! |---------|----------|
//! | [`MemoryStorage`] | Owning value; shared by cloning |
//! | [`SessionStorage`] | Process-wide, cleared with [`SessionStorage::clear`] |
//! | [`LocalStorage`] | JSON file on disk, survives restarts |
//! | [`NoopStorage`] | Never stores anything |
//!
//! The contract is async so persistent backends can do real I/O; the
//! in-memory ones complete immediately.

pub mod local;
pub mod memory;
pub mod noop;

use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

pub use local::LocalStorage;
pub use memory::{MemoryStorage, SessionStorage};
pub use noop::NoopStorage;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Minimal string key-value contract.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    async fn remove_item(&self, key: &str) -> StorageResult<()>;
}

/// Storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    Session,
    Local,
    Noop,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "session" => Ok(Self::Session),
            "local" => Ok(Self::Local),
            "noop" | "no-op" | "none" => Ok(Self::Noop),
            other => Err(format!("unknown storage kind `{other}`")),
        }
    }
}

/// Build a storage backend. `path` is only used by [`StorageKind::Local`].
pub fn create_storage(kind: StorageKind, path: impl AsRef<Path>) -> StorageResult<Arc<dyn StorageAdapter>> {
    let storage: Arc<dyn StorageAdapter> = match kind {
        StorageKind::Memory => Arc::new(MemoryStorage::new()),
        StorageKind::Session => Arc::new(SessionStorage::new()),
        StorageKind::Local => Arc::new(LocalStorage::open(path)?),
        StorageKind::Noop => Arc::new(NoopStorage),
    };
    Ok(storage)
}
