// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blocking-query wait bounds, shared by client-wide config and per-template
//! overrides.

use std::time::Duration;

/// A min/max wait window. `enabled` is only ever `true` for a per-template
/// `WaitConfig` when the template actually declared a wait — a zero-value
/// `WaitConfig` built from defaults stays disabled so it does not silently
/// clamp against global bounds it never opted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WaitConfig {
    pub min: Duration,
    pub max: Duration,
    pub enabled: bool,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
            enabled: false,
        }
    }
}

impl WaitConfig {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            enabled: true,
        }
    }

    /// Validate that `min <= max`.
    pub fn validate(&self) -> Result<(), (Duration, Duration)> {
        if self.enabled && self.min > self.max {
            Err((self.min, self.max))
        } else {
            Ok(())
        }
    }

    /// Clamp this wait window so it stays within `global`, when both sides
    /// are enabled. Per-template waits that were never declared are left
    /// untouched — they inherit the global bounds entirely at the renderer
    /// config layer rather than being clamped here.
    pub fn clamp_to(&self, global: &WaitConfig) -> WaitConfig {
        if !self.enabled || !global.enabled {
            return *self;
        }
        WaitConfig {
            min: self.min.max(global.min),
            max: self.max.min(global.max),
            enabled: true,
        }
    }
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod tests;
