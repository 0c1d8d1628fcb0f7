// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Page environment the relayer script is loaded into.
//!
//! A browser embedding (e.g. a wasm frontend) implements [`ScriptHost`] on
//! top of the DOM: `<script>` tags keyed by `src` and the global object the
//! script installs. Native builds have no such page; see [`HeadlessHost`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::instance::RelayerSdkGlobal;

/// DOM operations needed by the script loader.
#[async_trait]
pub trait ScriptHost: Send + Sync {
    /// Whether a document and global object are available.
    fn is_browser(&self) -> bool;

    /// The relayer SDK global, if a script installed one.
    fn relayer_sdk(&self) -> Option<Arc<RelayerSdkGlobal>>;

    /// Whether a `<script>` tag with this `src` is already in the document.
    fn has_script(&self, src: &str) -> bool;

    /// Append a `<script>` tag and wait for its `load` or `error` event.
    async fn inject_script(&self, src: &str) -> Result<(), String>;

    /// Attach `load`/`error` listeners to an existing tag and wait.
    async fn wait_for_script(&self, src: &str) -> Result<(), String>;

    /// Remove the `<script>` tag with this `src`, if any.
    fn remove_script(&self, src: &str);
}

/// Host for processes without a page. Every load fails as browser-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessHost;

#[async_trait]
impl ScriptHost for HeadlessHost {
    fn is_browser(&self) -> bool {
        false
    }

    fn relayer_sdk(&self) -> Option<Arc<RelayerSdkGlobal>> {
        None
    }

    fn has_script(&self, _src: &str) -> bool {
        false
    }

    async fn inject_script(&self, _src: &str) -> Result<(), String> {
        Err("no document available".to_string())
    }

    async fn wait_for_script(&self, _src: &str) -> Result<(), String> {
        Err("no document available".to_string())
    }

    fn remove_script(&self, _src: &str) {}
}
