// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The declared template: one source/destination pair plus the knobs that
//! control how it renders and what happens when it changes.

use crate::change_mode::ChangeMode;
use crate::error::ConfigError;
use crate::id::TemplateId;
use crate::permissions::parse_permissions;
use crate::wait::WaitConfig;
use std::path::PathBuf;
use std::time::Duration;

/// One declared template. Source is either inline content or a path on the
/// host; exactly one of `source` / `embedded_content` is ever populated —
/// enforced by `validate`, not by the type (the declarative spec format
/// that feeds this carries them as two optional fields).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSpec {
    /// Groups renderings of the same destination for batch aggregation.
    pub id: TemplateId,

    pub source: Option<PathBuf>,
    pub embedded_content: Option<String>,

    /// Destination path, relative to the task's working directory unless
    /// `disable_sandbox` is set on the client config.
    pub destination: PathBuf,

    pub change_mode: ChangeMode,

    /// Raw octal string as declared (`"0644"`); resolved via
    /// `resolved_perms` so a bad value surfaces as a `ConfigError` instead
    /// of panicking deep in the runner-config builder.
    pub perms: Option<String>,

    pub left_delimiter: Option<String>,
    pub right_delimiter: Option<String>,

    /// Missing-key policy for value resolution: `true` aborts the render
    /// with an error, `false` substitutes an empty value and continues.
    pub error_on_missing_key: bool,

    pub wait: WaitConfig,

    /// Upper bound on the random delay the dispatcher waits, after this
    /// template joins a dirty batch, before acting on the batch — spreads
    /// out simultaneous restarts when several tasks' templates depend on
    /// the same changed key. Zero disables splaying for this template.
    pub splay: Duration,

    /// Only the task's declared environment is visible to this template's
    /// functions — never the ambient process environment.
    pub env: bool,

    /// Every template in one task's set must agree on this flag; see
    /// `validate_set`.
    pub once: bool,

    /// File owner, applied to the destination after it is written.
    /// Negative means "leave as the renderer's own process identity" —
    /// mirrored faithfully by `resolved_owner` rather than folded into
    /// `Option` at this layer, since the declarative format carries it as
    /// a signed integer with -1 as its "unset" sentinel.
    pub uid: i64,
    pub gid: i64,
}

impl TemplateSpec {
    pub fn resolved_perms(&self) -> Result<Option<u32>, ConfigError> {
        self.perms.as_deref().map(parse_permissions).transpose()
    }

    /// `uid`/`gid` only apply when declared as non-negative; a negative
    /// value is the declarative format's "unset" sentinel, not a real id.
    pub fn resolved_uid(&self) -> Option<u32> {
        u32::try_from(self.uid).ok()
    }

    pub fn resolved_gid(&self) -> Option<u32> {
        u32::try_from(self.gid).ok()
    }

    /// Per-template structural checks that don't depend on sibling specs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.is_none() && self.embedded_content.is_none() {
            return Err(ConfigError::BadConfig(format!(
                "template {} declares neither source nor embedded content",
                self.id
            )));
        }
        if self.source.is_some() && self.embedded_content.is_some() {
            return Err(ConfigError::BadConfig(format!(
                "template {} declares both source and embedded content",
                self.id
            )));
        }
        self.resolved_perms()?;
        self.wait
            .validate()
            .map_err(|(min, max)| ConfigError::WaitInvalid {
                min: format!("{min:?}"),
                max: format!("{max:?}"),
            })?;
        Ok(())
    }
}

/// Validate invariants that span an entire task's template set.
///
/// A task may mix `change_mode`s freely across its templates, but `once`
/// (render-and-exit) is a task-wide posture, not a per-template one: a
/// rendering engine watching one task cannot simultaneously stay resident
/// for one template and exit after the first pass for another.
pub fn validate_set(specs: &[TemplateSpec]) -> Result<(), ConfigError> {
    for spec in specs {
        spec.validate()?;
    }
    if let Some(first) = specs.first() {
        let once = first.once;
        if specs.iter().any(|s| s.once != once) {
            return Err(ConfigError::BadConfig(
                "once must be consistent across a task's template set".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "template_spec_tests.rs"]
mod tests;
