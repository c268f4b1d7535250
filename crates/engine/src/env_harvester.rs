// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C7 — harvests `KEY=VALUE` pairs from a rendered destination back into
//! the task's environment, for templates declared with `env = true`.
//!
//! The destination path was already sandbox-checked once, at translation
//! time (see `translator::translate`); the harvester trusts that and
//! never re-validates it — re-deriving the check here would just be a
//! second copy of the same rule to keep in sync.

use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use ttm_core::TemplateId;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("failed to read env template {path}: {message}")]
    ReadFailed { path: String, message: String },
}

pub struct EnvHarvester {
    /// Declaration order matters: a later `env` template's keys win over an
    /// earlier one's on conflict.
    sources: Vec<(TemplateId, PathBuf)>,
}

impl EnvHarvester {
    pub fn new(sources: Vec<(TemplateId, PathBuf)>) -> Self {
        Self { sources }
    }

    /// Re-read every declared env-template destination and merge them, in
    /// declaration order, into one variable map.
    pub fn harvest_all(&self) -> Result<HashMap<String, String>, HarvestError> {
        let mut vars = HashMap::new();
        for (_, path) in &self.sources {
            let entries = dotenvy::from_path_iter(path).map_err(|e| HarvestError::ReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            for entry in entries {
                let (key, value) = entry.map_err(|e| HarvestError::ReadFailed {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                vars.insert(key, value);
            }
        }
        Ok(vars)
    }
}

#[cfg(test)]
#[path = "env_harvester_tests.rs"]
mod tests;
