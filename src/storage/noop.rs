// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use async_trait::async_trait;

use super::{StorageAdapter, StorageResult};

/// Storage that drops every write. Disables signature caching.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStorage;

#[async_trait]
impl StorageAdapter for NoopStorage {
    async fn get_item(&self, _key: &str) -> StorageResult<Option<String>> {
        Ok(None)
    }

    async fn set_item(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Ok(())
    }

    async fn remove_item(&self, _key: &str) -> StorageResult<()> {
        Ok(())
    }
}
