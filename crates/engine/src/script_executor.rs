// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C6 — runs the scripts for one dirty batch.
//!
//! Every script in a batch is spawned as its own task and the batch joins
//! before returning control to C5: a failing script never prevents its
//! siblings — already spawned — from completing. Only after every script
//! has run does the executor report whether the batch should be treated as
//! failed, taking the first `fail_on_error` failure encountered in batch
//! declaration order.

use crate::error::ScriptError;
use std::sync::Arc;
use ttm_adapters::{EventEmitter, TaskLifecycle};
use ttm_core::{ScriptSpec, TaskEvent};

pub async fn run_batch<L, Em>(
    scripts: &[ScriptSpec],
    lifecycle: &Arc<L>,
    emitter: &Em,
) -> Result<(), ScriptError>
where
    L: TaskLifecycle,
    Em: EventEmitter,
{
    let mut handles = Vec::with_capacity(scripts.len());
    for script in scripts {
        let script = script.clone();
        let lifecycle = Arc::clone(lifecycle);
        let emitter = emitter.clone();
        handles.push(tokio::spawn(
            async move { run_one(&script, &lifecycle, &emitter).await },
        ));
    }

    let mut first_failure = None;
    for (script, handle) in scripts.iter().zip(handles) {
        match handle.await {
            Ok(Some(err)) if first_failure.is_none() => first_failure = Some(err),
            Ok(_) => {}
            Err(join_err) if first_failure.is_none() => {
                first_failure = Some(ScriptError::ExecFailed {
                    command: script.command.clone(),
                    message: join_err.to_string(),
                });
            }
            Err(_) => {}
        }
    }

    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Run one script to completion, emitting the matching telemetry event.
/// Returns the batch-level error only when `fail_on_error` is set — a
/// script that fails without `fail_on_error` still gets its
/// `TaskHookFailed` event, it just never escalates.
async fn run_one<L, Em>(script: &ScriptSpec, lifecycle: &L, emitter: &Em) -> Option<ScriptError>
where
    L: TaskLifecycle,
    Em: EventEmitter,
{
    let outcome = tokio::time::timeout(
        script.timeout,
        lifecycle.exec(&script.command, &script.args, script.timeout),
    )
    .await;

    let span = tracing::info_span!("script", command = %script.command);
    let _guard = span.enter();

    match outcome {
        Ok(Ok(result)) if result.succeeded() => {
            tracing::info!("script completed successfully");
            emitter
                .emit(TaskEvent::TaskHookMessage {
                    message: format!(
                        "Template ran script {:?} on change, successfully",
                        script.command
                    ),
                })
                .await;
            None
        }
        Ok(Ok(result)) => {
            let message = format!(
                "Template ran script {:?} on change but it exited with code: {}",
                script.command, result.exit_code
            );
            tracing::warn!(exit_code = result.exit_code, "script exited nonzero");
            emitter
                .emit(TaskEvent::TaskHookFailed {
                    message: message.clone(),
                })
                .await;
            script.fail_on_error.then_some(ScriptError::NonZeroExit {
                command: script.command.clone(),
                exit_code: result.exit_code,
            })
        }
        Ok(Err(e)) => {
            let message = format!(
                "Template failed to run script {:?} on change: {}. Exit code: {}",
                script.command, e, -1
            );
            tracing::error!(error = %e, "script exec failed");
            emitter
                .emit(TaskEvent::TaskHookFailed {
                    message: message.clone(),
                })
                .await;
            script.fail_on_error.then_some(ScriptError::ExecFailed {
                command: script.command.clone(),
                message: e.to_string(),
            })
        }
        Err(_elapsed) => {
            let message = format!(
                "Template failed to run script {:?} on change: timed out after {}s. Exit code: {}",
                script.command,
                script.timeout.as_secs(),
                -1
            );
            tracing::warn!(timeout_secs = script.timeout.as_secs(), "script timed out");
            emitter
                .emit(TaskEvent::TaskHookFailed {
                    message: message.clone(),
                })
                .await;
            script.fail_on_error.then_some(ScriptError::TimedOut {
                command: script.command.clone(),
                timeout_secs: script.timeout.as_secs(),
            })
        }
    }
}

#[cfg(test)]
#[path = "script_executor_tests.rs"]
mod tests;
