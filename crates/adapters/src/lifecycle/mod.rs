// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task lifecycle collaborator: the operations the TTM drives on the task
//! itself. Owned by the task runner, not the TTM — kill/signal/restart/exec
//! all happen "to" the task from outside.

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTaskLifecycle, LifecycleCall};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use ttm_core::{SignalToken, TaskEvent};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("task is not running")]
    NotRunning,
    #[error("signal delivery failed: {0}")]
    SignalFailed(String),
    #[error("restart failed: {0}")]
    RestartFailed(String),
    #[error("script exec failed: {0}")]
    ExecFailed(String),
}

/// Outcome of a change-mode script execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Collaborator that owns the task's process/container lifecycle.
///
/// The TTM never starts or fully stops the task itself — `kill` ends the
/// task as a terminal action (e.g. a failed prestart hook), while `signal`
/// and `restart` are in-place reactions to a re-render the task keeps
/// running through.
#[async_trait]
pub trait TaskLifecycle: Send + Sync + 'static {
    /// Whether the task is currently running. The dispatcher consults this
    /// at the moment it is about to act, not from a cached flag, since the
    /// task may stop for reasons outside the TTM's knowledge.
    async fn is_running(&self) -> bool;

    async fn kill(&self, event: TaskEvent) -> Result<(), LifecycleError>;

    async fn signal(&self, token: &SignalToken, event: TaskEvent) -> Result<(), LifecycleError>;

    async fn restart(&self, event: TaskEvent) -> Result<(), LifecycleError>;

    /// Run a change-mode script inside the task's execution context.
    async fn exec(
        &self,
        command: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ExecResult, LifecycleError>;
}
