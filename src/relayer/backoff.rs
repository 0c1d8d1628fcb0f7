// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Exponential backoff with jitter for script load retries.

use std::time::Duration;

use rand::Rng;

/// Maximum relative jitter applied to each delay (±25%).
pub const JITTER_FACTOR: f64 = 0.25;

/// Retry settings of the relayer script loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry `attempt` (0-indexed) with random jitter.
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let jitter = rand::thread_rng().gen_range(-JITTER_FACTOR..=JITTER_FACTOR);
        self.backoff_with_jitter(attempt, jitter)
    }

    /// `min(initial_delay * 2^attempt * (1 + jitter), max_delay)`.
    pub fn backoff_with_jitter(&self, attempt: u32, jitter: f64) -> Duration {
        let jitter = jitter.clamp(-JITTER_FACTOR, JITTER_FACTOR);
        let exponential = self.initial_delay.as_secs_f64() * 2f64.powi(attempt.min(63) as i32);
        let delay = exponential * (1.0 + jitter);

        if !delay.is_finite() || delay >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(delay.max(0.0))
    }
}
