// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory storage backends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;

use super::{StorageAdapter, StorageError, StorageResult};

/// Map-backed store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

fn session_entries() -> &'static MemoryStorage {
    static SESSION: OnceLock<MemoryStorage> = OnceLock::new();
    SESSION.get_or_init(MemoryStorage::new)
}

/// Process-wide store: every `SessionStorage` handle sees the same entries
/// until [`SessionStorage::clear`] is called or the process exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStorage;

impl SessionStorage {
    pub fn new() -> Self {
        Self
    }

    /// Drop every entry of the session.
    pub fn clear(&self) {
        session_entries().clear();
    }
}

#[async_trait]
impl StorageAdapter for SessionStorage {
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        session_entries().get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        session_entries().set_item(key, value).await
    }

    async fn remove_item(&self, key: &str) -> StorageResult<()> {
        session_entries().remove_item(key).await
    }
}
