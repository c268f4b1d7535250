// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime errors.
//!
//! Unlike `ttm_core::ConfigError`, nothing here is returned to the caller
//! of `TemplateRunner::run` — every variant is translated into a
//! `TaskLifecycle::kill` call and surfaced to the caller only as an emitted
//! `TaskEvent`, matching the upstream rendering engine's own contract that
//! a running template pipeline fails closed, not by propagating a `Result`
//! out of an event loop nobody is polling anymore.

use thiserror::Error;
use ttm_adapters::{EnvError, LifecycleError, RendererError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("rendering engine error: {0}")]
    Renderer(#[from] RendererError),

    #[error("lifecycle call failed: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("failed to assemble task environment: {0}")]
    Env(#[from] EnvError),

    #[error("change-mode script failed: {0}")]
    Script(#[from] ScriptError),

    #[error("template dependencies never resolved: {0:?}")]
    MissingDeps(Vec<String>),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("script {command:?} exited {exit_code}")]
    NonZeroExit { command: String, exit_code: i32 },

    #[error("script {command:?} timed out after {timeout_secs}s")]
    TimedOut { command: String, timeout_secs: u64 },

    #[error("script {command:?} failed to execute: {message}")]
    ExecFailed { command: String, message: String },
}
