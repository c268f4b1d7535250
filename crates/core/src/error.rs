// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Construction-time errors.
//!
//! Every variant here aborts setup before the rendering engine is started —
//! none of them are recoverable at runtime, which is why they are surfaced
//! directly to the caller instead of being translated into a lifecycle
//! event (contrast with `ttm_engine::RunError`).

use thiserror::Error;

/// Errors that can occur while building a `TemplateRunner`.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("bad config: {0}")]
    BadConfig(String),

    #[error("unknown change signal: {0}")]
    BadSignal(String),

    #[error("template source escapes sandbox: {0}")]
    SandboxEscapeSource(String),

    #[error("template destination escapes sandbox: {0}")]
    SandboxEscapeDestination(String),

    #[error("invalid file permissions {0:?}: {1}")]
    BadPermissions(String, String),

    #[error("invalid basic auth string: {0}")]
    BadAuth(String),

    #[error("invalid wait bounds: min {min:?} > max {max:?}")]
    WaitInvalid { min: String, max: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
