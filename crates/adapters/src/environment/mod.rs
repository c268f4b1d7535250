// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment collaborator: the task's declared environment and sandbox
//! root, as assembled by the task runner — never read from the ambient
//! process environment.

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeEnvironmentBuilder;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("failed to assemble task environment: {0}")]
    BuildFailed(String),
}

/// The task's declared environment, as the runner assembles it for one
/// evaluation of the template set.
///
/// `get`/`all` only ever expose variables explicitly present in `vars` —
/// there is no fallback to `std::env`. A template reading
/// `env "SOME_HOST_VAR"` for a key the task never declared sees an empty
/// string, exactly as if the host process had never set it.
#[derive(Debug, Clone)]
pub struct TaskEnv {
    task_dir: PathBuf,
    vars: HashMap<String, String>,
}

impl TaskEnv {
    pub fn new(task_dir: PathBuf, vars: HashMap<String, String>) -> Self {
        Self { task_dir, vars }
    }

    pub fn get(&self, key: &str) -> &str {
        self.vars.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn all(&self) -> &HashMap<String, String> {
        &self.vars
    }

    /// Resolve `path` against the task's sandbox root. A relative path
    /// joins onto `task_dir`; an absolute path is returned unchanged so the
    /// caller can run the sandbox-escape check against it (escapes are a
    /// construction-time `ConfigError`, not something this method decides).
    pub fn client_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.task_dir.join(path)
        }
    }

    pub fn task_dir(&self) -> &Path {
        &self.task_dir
    }
}

/// Collaborator that assembles a `TaskEnv` for the running task.
#[async_trait]
pub trait EnvironmentBuilder: Send + Sync + 'static {
    async fn build(&self) -> Result<TaskEnv, EnvError>;

    /// Publish the variables the env harvester (C7) read back out of a
    /// rendered `env = true` destination, so the host's environment
    /// assembly for the task's main process picks them up. Called once
    /// after the first-render gate opens, and again after every later
    /// batch that touches an env-marked template.
    async fn set_template_env(&self, vars: HashMap<String, String>);
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
