// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C3 — the per-task table mapping each declared template to its change
//! action, and the aggregation rule the dispatcher applies across one
//! dirty batch.
//!
//! Signal names are parsed here, at table construction: a declared
//! `ChangeMode::Signal` carries the raw name as written in the spec, and
//! `SignalTable::build` is the one place that resolves it into an opaque
//! `SignalToken`, failing construction on an unparseable name (§3
//! invariant 2). Nothing downstream ever re-parses a name — the
//! dispatcher only ever sees already-resolved tokens.

use std::collections::HashMap;
use ttm_core::{parse_signal_name, ChangeMode, ConfigError, ScriptSpec, SignalToken, TemplateId, TemplateSpec};

/// The aggregated action for one dirty batch, in the priority order the
/// dispatcher applies: a restart anywhere in the batch supersedes every
/// signal and script in it; barring a restart, every distinct signal token
/// declared by a dirty template is delivered *and* every dirty template's
/// script runs — signal and script modes are independent, not mutually
/// exclusive, within the same batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchAction {
    Noop,
    Restart,
    Apply {
        signals: Vec<SignalToken>,
        scripts: Vec<ScriptSpec>,
    },
}

/// A declared change mode with its signal name already resolved to a
/// token — the table's internal, post-validation counterpart to
/// `ttm_core::ChangeMode`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ResolvedMode {
    Noop,
    Signal(SignalToken),
    Restart,
    Script(ScriptSpec),
}

pub struct SignalTable {
    /// Every spec's resolved change mode, grouped by id — a destination
    /// can be produced by more than one declared `TemplateSpec` (see
    /// `TemplateId`'s doc comment), and §4.5 step 5 aggregates across
    /// *all* of them, not just the last one registered for that id.
    modes: HashMap<TemplateId, Vec<ResolvedMode>>,
}

impl SignalTable {
    /// Build the table, resolving every declared `ChangeMode::Signal`
    /// name into a `SignalToken`. Fails with `ConfigError::BadSignal` on
    /// the first unparseable name encountered.
    pub fn build(specs: &[TemplateSpec]) -> Result<Self, ConfigError> {
        let mut modes: HashMap<TemplateId, Vec<ResolvedMode>> = HashMap::new();
        for spec in specs {
            let resolved = match &spec.change_mode {
                ChangeMode::Noop => ResolvedMode::Noop,
                ChangeMode::Restart => ResolvedMode::Restart,
                ChangeMode::Script(script) => ResolvedMode::Script(script.clone()),
                ChangeMode::Signal(name) => {
                    let token = parse_signal_name(name)
                        .map_err(|_| ConfigError::BadSignal(name.clone()))?;
                    ResolvedMode::Signal(token)
                }
            };
            modes.entry(spec.id.clone()).or_default().push(resolved);
        }
        Ok(Self { modes })
    }

    /// Aggregate the change action for one batch of templates that just
    /// rendered. Unknown ids (not in the table) are ignored rather than
    /// treated as an error — the dispatcher only ever passes ids the table
    /// was built from.
    pub fn classify(&self, dirty: &[TemplateId]) -> BatchAction {
        let modes: Vec<&ResolvedMode> = dirty
            .iter()
            .filter_map(|id| self.modes.get(id))
            .flatten()
            .collect();

        if modes.iter().any(|m| matches!(m, ResolvedMode::Restart)) {
            return BatchAction::Restart;
        }

        let mut signals = Vec::new();
        for mode in &modes {
            if let ResolvedMode::Signal(token) = mode {
                if !signals.contains(token) {
                    signals.push(token.clone());
                }
            }
        }

        let scripts: Vec<ScriptSpec> = modes
            .iter()
            .filter_map(|m| match m {
                ResolvedMode::Script(spec) => Some(spec.clone()),
                _ => None,
            })
            .collect();

        if signals.is_empty() && scripts.is_empty() {
            return BatchAction::Noop;
        }

        BatchAction::Apply { signals, scripts }
    }
}

#[cfg(test)]
#[path = "signal_table_tests.rs"]
mod tests;
