// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake environment builder for engine-level tests.

use super::{EnvError, EnvironmentBuilder, TaskEnv};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct FakeEnvironmentBuilder {
    inner: Arc<Mutex<(PathBuf, HashMap<String, String>, Option<String>)>>,
    published: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl Default for FakeEnvironmentBuilder {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new((
                PathBuf::from("/task"),
                HashMap::new(),
                None,
            ))),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeEnvironmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vars(task_dir: PathBuf, vars: HashMap<String, String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new((task_dir, vars, None))),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn fail_with(&self, message: impl Into<String>) {
        self.inner.lock().2 = Some(message.into());
    }

    /// Every `set_template_env` call, in order, for tests to assert on.
    pub fn published(&self) -> Vec<HashMap<String, String>> {
        self.published.lock().clone()
    }

    pub fn last_published(&self) -> Option<HashMap<String, String>> {
        self.published.lock().last().cloned()
    }
}

#[async_trait]
impl EnvironmentBuilder for FakeEnvironmentBuilder {
    async fn build(&self) -> Result<TaskEnv, EnvError> {
        let (task_dir, vars, failure) = self.inner.lock().clone();
        if let Some(message) = failure {
            return Err(EnvError::BuildFailed(message));
        }
        Ok(TaskEnv::new(task_dir, vars))
    }

    async fn set_template_env(&self, vars: HashMap<String, String>) {
        self.published.lock().push(vars);
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
