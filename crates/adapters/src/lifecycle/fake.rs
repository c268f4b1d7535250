// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake task lifecycle for engine-level tests.

use super::{ExecResult, LifecycleError, TaskLifecycle};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use ttm_core::{SignalToken, TaskEvent};

/// One recorded lifecycle call, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleCall {
    Kill(TaskEvent),
    Signal(SignalToken, TaskEvent),
    Restart(TaskEvent),
    Exec(String, Vec<String>),
}

struct FakeState {
    running: bool,
    calls: Vec<LifecycleCall>,
    exec_result: ExecResult,
    exec_delay: Duration,
    fail_next: Option<LifecycleError>,
}

/// Records every call it receives; `running` defaults to `true` since most
/// tests exercise a task that is already up when the renderer starts
/// producing events.
#[derive(Clone)]
pub struct FakeTaskLifecycle {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeTaskLifecycle {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                running: true,
                calls: Vec::new(),
                exec_result: ExecResult {
                    exit_code: 0,
                    stdout: String::new(),
                    stderr: String::new(),
                },
                exec_delay: Duration::ZERO,
                fail_next: None,
            })),
        }
    }
}

impl FakeTaskLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_running(&self, running: bool) {
        self.inner.lock().running = running;
    }

    pub fn set_exec_result(&self, result: ExecResult) {
        self.inner.lock().exec_result = result;
    }

    /// Make `exec` sleep before returning, to exercise callers that wrap it
    /// in their own timeout.
    pub fn set_exec_delay(&self, delay: Duration) {
        self.inner.lock().exec_delay = delay;
    }

    pub fn fail_next_call(&self, err: LifecycleError) {
        self.inner.lock().fail_next = Some(err);
    }

    pub fn calls(&self) -> Vec<LifecycleCall> {
        self.inner.lock().calls.clone()
    }

    fn take_failure(&self) -> Option<LifecycleError> {
        self.inner.lock().fail_next.take()
    }
}

#[async_trait]
impl TaskLifecycle for FakeTaskLifecycle {
    async fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    async fn kill(&self, event: TaskEvent) -> Result<(), LifecycleError> {
        self.inner.lock().calls.push(LifecycleCall::Kill(event));
        match self.take_failure() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn signal(&self, token: &SignalToken, event: TaskEvent) -> Result<(), LifecycleError> {
        self.inner
            .lock()
            .calls
            .push(LifecycleCall::Signal(token.clone(), event));
        match self.take_failure() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn restart(&self, event: TaskEvent) -> Result<(), LifecycleError> {
        self.inner.lock().calls.push(LifecycleCall::Restart(event));
        match self.take_failure() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn exec(
        &self,
        command: &str,
        args: &[String],
        _timeout: Duration,
    ) -> Result<ExecResult, LifecycleError> {
        self.inner
            .lock()
            .calls
            .push(LifecycleCall::Exec(command.to_string(), args.to_vec()));
        let delay = self.inner.lock().exec_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        Ok(self.inner.lock().exec_result.clone())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
