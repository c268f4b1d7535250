// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-wide settings the host process hands to every `TemplateRunner` it
//! builds. Loaded by the host from whatever config file/flags it already
//! has — the TTM itself never reads a path or env var for these.

use crate::error::ConfigError;
use crate::wait::WaitConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

fn default_event_rate() -> Duration {
    Duration::from_secs(3)
}

fn default_splay() -> Duration {
    Duration::from_secs(5)
}

/// Client-wide settings recognized by the TTM (see the configuration table
/// in the design docs for each field's effect).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Minimum spacing between missing-dependency telemetry events.
    #[serde(with = "duration_secs")]
    pub max_template_event_rate: Duration,

    /// When true, bypass sandbox escape checks and sandbox-root rewriting.
    pub disable_sandbox: bool,

    /// Template functions the rendering engine must refuse to evaluate.
    pub function_denylist: HashSet<String>,

    pub block_query_wait_time: Option<Duration>,
    pub max_stale: Option<Duration>,

    /// Global wait bounds; per-template waits are clamped into these.
    pub wait_bounds: WaitConfig,

    /// Client-wide default splay, handed to the host's declarative spec
    /// loader as the value a template inherits when it never names its own
    /// `splay` directive at all. The TTM itself only ever sees the
    /// per-template `TemplateSpec::splay` this has already been folded
    /// into by the time a template set reaches construction.
    #[serde(with = "duration_secs")]
    pub splay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_template_event_rate: default_event_rate(),
            disable_sandbox: false,
            function_denylist: HashSet::new(),
            block_query_wait_time: None,
            max_stale: None,
            wait_bounds: WaitConfig::default(),
            splay: default_splay(),
        }
    }
}

impl ClientConfig {
    /// `MaxTemplateEventRate` must be positive — a zero value would either
    /// spin the missing-dep timer or (worse, depending on the timer
    /// implementation) never fire it at all. `wait_bounds` is checked the
    /// same way a per-template wait is (`TemplateSpec::validate`): every
    /// template's wait is eventually clamped into these bounds, so an
    /// inverted global window is just as fatal as an inverted per-template
    /// one, and needs to surface at the same construction-time point.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_template_event_rate.is_zero() {
            return Err(ConfigError::BadConfig(
                "MaxTemplateEventRate must be > 0".to_string(),
            ));
        }
        self.wait_bounds
            .validate()
            .map_err(|(min, max)| ConfigError::WaitInvalid {
                min: format!("{min:?}"),
                max: format!("{max:?}"),
            })?;
        Ok(())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_secs_f64().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

#[cfg(test)]
#[path = "client_config_tests.rs"]
mod tests;
