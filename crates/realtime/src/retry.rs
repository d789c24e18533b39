// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnect bookkeeping.
//!
//! The attempt counter and endpoint index live together in [`RetryState`],
//! and every change goes through one of its transitions. The connection
//! manager owns exactly one.

use std::time::Duration;

/// Exponential backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy {
            base_delay: Duration::from_millis(1000),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// What to do after a failed or lost session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule retry number `attempt` after `delay`.
    Retry { attempt: u32, delay: Duration },
    /// Stop retrying automatically.
    Exhausted { attempts: u32 },
}

/// Consecutive-failure counter plus the endpoint currently in use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    attempt: u32,
    endpoint: usize,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consecutive failures since the last successful open.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Index of the endpoint the next connection uses.
    pub fn endpoint(&self) -> usize {
        self.endpoint
    }

    /// Records one failure and decides whether to retry.
    ///
    /// Once `max_attempts` retries have been scheduled the counter stops
    /// advancing, so every later failure is also exhausted.
    pub fn record_failure(&mut self, policy: &ReconnectPolicy) -> RetryDecision {
        if self.attempt >= policy.max_attempts {
            return RetryDecision::Exhausted {
                attempts: self.attempt,
            };
        }
        self.attempt += 1;
        RetryDecision::Retry {
            attempt: self.attempt,
            delay: policy.delay_for(self.attempt),
        }
    }

    /// A session opened: the counter starts over. The endpoint is kept.
    pub fn record_connected(&mut self) {
        self.attempt = 0;
    }

    /// Advances to the next of `count` endpoints, wrapping around.
    pub fn rotate_endpoint(&mut self, count: usize) {
        if count > 0 {
            self.endpoint = (self.endpoint + 1) % count;
        }
    }

    /// Back to the primary endpoint with no recorded failures.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
