// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal name parsing.
//!
//! Templates declare change signals by POSIX name (`"SIGHUP"`, `"SIGUSR1"`,
//! ...). The lifecycle collaborator only understands opaque tokens, so
//! construction resolves each declared name once and carries the token
//! forward — unknown names are rejected before the task ever starts.

use std::fmt;

crate::define_id! {
    /// Opaque signal token understood by the lifecycle collaborator.
    ///
    /// Carries the resolved signal name (not a raw integer) because the
    /// lifecycle collaborator, not the TTM, owns the platform mapping from
    /// name to delivery mechanism.
    pub struct SignalToken;
}

/// The set of signal names recognized by the translator. Limited to the
/// signals a task's change_mode is ever realistically configured with.
const KNOWN_SIGNALS: &[&str] = &[
    "SIGHUP", "SIGINT", "SIGQUIT", "SIGKILL", "SIGTERM", "SIGUSR1", "SIGUSR2",
    "SIGALRM", "SIGSTOP", "SIGCONT", "SIGWINCH", "SIGPIPE", "SIGABRT",
];

/// Error returned when a declared change-signal name cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSignalError(pub String);

impl fmt::Display for UnknownSignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown signal: {}", self.0)
    }
}

impl std::error::Error for UnknownSignalError {}

/// Parse a declared change-signal name into an opaque token.
///
/// Case-sensitive; a leading/trailing space is not tolerated since templates
/// come from a declarative spec, not free-form user typing.
pub fn parse_signal_name(name: &str) -> Result<SignalToken, UnknownSignalError> {
    if KNOWN_SIGNALS.contains(&name) {
        Ok(SignalToken::new(name))
    } else {
        Err(UnknownSignalError(name.to_string()))
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
