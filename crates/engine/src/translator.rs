// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C1 — translates a task's declared `TemplateSpec` set into the renderer's
//! `TranslatedTemplate` wire shape, resolving perms and enforcing the
//! sandbox-escape contract along the way.

use std::collections::HashSet;
use std::path::{Component, Path};
use ttm_adapters::{TaskEnv, TranslatedTemplate};
use ttm_core::{validate_set, ConfigError, TemplateSpec};

/// True if a declared (pre-join) relative path ever walks above the
/// sandbox root via `..`. An absolute path always counts as an escape: the
/// sandbox contract is that destinations live under the task directory
/// unless the client has disabled sandboxing entirely.
fn path_escapes_sandbox(declared: &Path) -> bool {
    let mut depth: i64 = 0;
    for component in declared.components() {
        match component {
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return true;
                }
            }
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return true,
        }
    }
    false
}

/// Translate one task's template set, grounded on its declared specs plus
/// the environment the task runner assembled for it.
///
/// `disable_sandbox` bypasses the escape checks entirely (client-wide
/// opt-out); perms are resolved here so a malformed octal string surfaces
/// before the renderer is ever started, not as a runtime write failure.
/// `function_denylist` is copied onto every descriptor verbatim — §4.1
/// describes it as inherited from client configuration, not per-template.
pub fn translate(
    specs: &[TemplateSpec],
    env: &TaskEnv,
    disable_sandbox: bool,
    function_denylist: &HashSet<String>,
) -> Result<Vec<TranslatedTemplate>, ConfigError> {
    validate_set(specs)?;

    specs
        .iter()
        .map(|spec| translate_one(spec, env, disable_sandbox, function_denylist))
        .collect()
}

fn translate_one(
    spec: &TemplateSpec,
    env: &TaskEnv,
    disable_sandbox: bool,
    function_denylist: &HashSet<String>,
) -> Result<TranslatedTemplate, ConfigError> {
    if !disable_sandbox {
        if let Some(source) = &spec.source {
            if path_escapes_sandbox(source) {
                return Err(ConfigError::SandboxEscapeSource(source.display().to_string()));
            }
        }
        if path_escapes_sandbox(&spec.destination) {
            return Err(ConfigError::SandboxEscapeDestination(
                spec.destination.display().to_string(),
            ));
        }
    }

    let perms = spec.resolved_perms()?;
    let destination = env.client_path(&spec.destination);
    let source = spec.source.as_ref().map(|s| env.client_path(s));

    Ok(TranslatedTemplate {
        id: spec.id.clone(),
        source,
        embedded_content: spec.embedded_content.clone(),
        destination,
        perms,
        left_delimiter: spec.left_delimiter.clone(),
        right_delimiter: spec.right_delimiter.clone(),
        error_on_missing_key: spec.error_on_missing_key,
        wait: spec.wait,
        env: spec.env,
        uid: spec.resolved_uid(),
        gid: spec.resolved_gid(),
        function_denylist: function_denylist.clone(),
    })
}

#[cfg(test)]
#[path = "translator_tests.rs"]
mod tests;
