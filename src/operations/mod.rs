// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Encrypt and decrypt helpers built on a ready instance.
//!
//! Obtain the instance with [`FhevmOrchestrator::ready_instance`](crate::orchestrator::FhevmOrchestrator::ready_instance).

mod decrypt;
mod encrypt;

pub use decrypt::{public_decrypt_handles, user_decrypt_handles};
pub use encrypt::encrypt_values;
