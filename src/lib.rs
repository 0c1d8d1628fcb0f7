// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! fhevm-sdk - Confidential Token Client SDK
//!
//! Client-side core for FHE-encrypted token operations on EVM chains. The
//! cryptography lives behind [`instance::FhevmInstance`]; this crate manages
//! the decryption authorizations and the instance lifecycle around it.
//!
//! ## Modules
//!
//! - `config` - Chain registry and environment settings
//! - `storage` - Key/value stores for cached signatures
//! - `provider` - EIP-1193 wallet transport (local key, JSON-RPC)
//! - `relayer` - Relayer SDK script loading with retry
//! - `instance` - FHEVM instance and relayer SDK boundary
//! - `signature` - EIP-712 decryption signatures and their cache
//! - `orchestrator` - Instance bootstrap state machine
//! - `operations` - Encrypt and decrypt helpers
//! - `logging` - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod instance;
pub mod logging;
pub mod operations;
pub mod orchestrator;
pub mod provider;
pub mod relayer;
pub mod signature;
pub mod storage;

pub use error::{SdkError, SdkResult};
