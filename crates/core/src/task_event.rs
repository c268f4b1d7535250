// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events the TTM hands to the task lifecycle and event-emitter
//! collaborators. One enum covers both uses: some variants are arguments to
//! a lifecycle call (`Kill`, `Signal`, `Restart`), others are pure telemetry
//! delivered only through the emitter (`TaskHookMessage`, `TaskHookFailed`).

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// Task is being killed. `fails_task` distinguishes an engine/runtime
    /// failure from a script opting into `fail_on_error`.
    TaskKilling { message: String, fails_task: bool },

    /// One or more signals are about to be (or failed to be) delivered.
    TaskSignaling { message: String },

    /// A `change_mode = restart` template re-rendered.
    TaskRestartSignal { message: String },

    /// A change-mode script completed successfully.
    TaskHookMessage { message: String },

    /// A change-mode script failed (non-zero exit or transport error).
    TaskHookFailed { message: String },

    /// Missing template dependencies, deduplicated and rate-limited.
    TaskMissingDeps { message: String },
}

impl TaskEvent {
    pub fn message(&self) -> &str {
        match self {
            TaskEvent::TaskKilling { message, .. }
            | TaskEvent::TaskSignaling { message }
            | TaskEvent::TaskRestartSignal { message }
            | TaskEvent::TaskHookMessage { message }
            | TaskEvent::TaskHookFailed { message }
            | TaskEvent::TaskMissingDeps { message } => message,
        }
    }

    pub fn kill(message: impl Into<String>, fails_task: bool) -> Self {
        TaskEvent::TaskKilling {
            message: message.into(),
            fails_task,
        }
    }
}

#[cfg(test)]
#[path = "task_event_tests.rs"]
mod tests;
