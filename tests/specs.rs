// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box scenarios exercising `TemplateRunner` end to end through its
//! public API and the adapter fakes, one test per concrete scenario the
//! task template manager is expected to handle.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use ttm_adapters::{
    FakeEnvironmentBuilder, FakeEventEmitter, FakeTaskLifecycle, FakeTemplateRenderer,
    LifecycleCall, RenderChannelMsg, RenderEventNotice,
};
use ttm_core::{parse_signal_name, ChangeMode, ClientConfig, MissingDeps, ScriptSpec, TaskEvent, TemplateId, TemplateSpec, WaitConfig};
use ttm_engine::{ConsulDirectives, NomadDirectives, TemplateRunner, TemplateRunnerConfig, VaultDirectives};

fn spec(id: &str, mode: ChangeMode) -> TemplateSpec {
    TemplateSpec {
        id: TemplateId::new(id),
        source: None,
        embedded_content: Some("{{ . }}".to_string()),
        destination: PathBuf::from(format!("out/{id}.conf")),
        change_mode: mode,
        perms: None,
        left_delimiter: None,
        right_delimiter: None,
        error_on_missing_key: false,
        wait: WaitConfig::default(),
        splay: Duration::ZERO,
        env: false,
        once: false,
        uid: -1,
        gid: -1,
    }
}

struct Scenario {
    runner: Arc<
        TemplateRunner<FakeTaskLifecycle, FakeEventEmitter, FakeEnvironmentBuilder, FakeTemplateRenderer>,
    >,
    renderer: ttm_adapters::FakeTemplateRendererHandle,
    lifecycle: FakeTaskLifecycle,
    emitter: FakeEventEmitter,
}

async fn scenario(specs: Vec<TemplateSpec>, client: ClientConfig) -> Scenario {
    let lifecycle = FakeTaskLifecycle::new();
    let emitter = FakeEventEmitter::new();
    let env_builder = FakeEnvironmentBuilder::new();
    let renderer = FakeTemplateRenderer::new();
    let handle = renderer.handle();

    let runner = TemplateRunner::new(TemplateRunnerConfig {
        specs,
        client,
        consul: ConsulDirectives::default(),
        vault: VaultDirectives::default(),
        nomad: NomadDirectives::default(),
        agent_namespace: None,
        lifecycle: Arc::new(lifecycle.clone()),
        emitter: emitter.clone(),
        env_builder,
        renderer,
    })
    .await
    .expect("construction should succeed");

    Scenario {
        runner: Arc::new(runner),
        renderer: handle,
        lifecycle,
        emitter,
    }
}

fn decision(id: &str, rendered: bool) -> RenderChannelMsg {
    let now = SystemTime::now();
    RenderChannelMsg::Decision(RenderEventNotice {
        id: TemplateId::new(id),
        event: ttm_core::RenderEvent::new(now, if rendered { now } else { ttm_core::RenderEvent::ZERO }),
    })
}

/// Scenario 1: one template, mode=signal "SIGHUP"; engine renders at t0;
/// expect a `Signal` call carrying the resolved token and the standard
/// re-render message.
#[tokio::test]
async fn one_signal_template_reports_signal_with_standard_message() {
    let hup = parse_signal_name("SIGHUP").unwrap();
    let sc = scenario(
        vec![spec("a", ChangeMode::Signal("SIGHUP".to_string()))],
        ClientConfig::default(),
    )
    .await;
    sc.lifecycle.set_running(true);

    let renderer = sc.renderer.clone();
    let runner = sc.runner.clone();
    let run = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    renderer.push_render_event(decision("a", true));
    tokio::time::sleep(Duration::from_millis(50)).await;
    run.abort();

    let calls = sc.lifecycle.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        LifecycleCall::Signal(token, event) => {
            assert_eq!(token, &hup);
            assert_eq!(event.message(), "Template re-rendered");
        }
        other => panic!("expected Signal, got {other:?}"),
    }
}

/// Scenario 2: two templates in the same batch, one restart and one
/// signal; expect exactly one `Restart` call and zero `Signal` calls.
#[tokio::test]
async fn restart_and_signal_in_same_batch_yields_restart_only() {
    let specs = vec![
        spec("a", ChangeMode::Signal("SIGHUP".to_string())),
        spec("b", ChangeMode::Restart),
    ];
    let sc = scenario(specs, ClientConfig::default()).await;
    sc.lifecycle.set_running(true);

    let renderer = sc.renderer.clone();
    let runner = sc.runner.clone();
    let run = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    renderer.push_render_event(decision("a", true));
    renderer.push_render_event(decision("b", true));
    tokio::time::sleep(Duration::from_millis(50)).await;
    run.abort();

    let calls = sc.lifecycle.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], LifecycleCall::Restart(_)));
    assert!(!calls.iter().any(|c| matches!(c, LifecycleCall::Signal(_, _))));
}

/// Scenario 3: script mode exits 7 with `fail_on_error = true`; expect one
/// `TaskHookFailed` telemetry event naming the exit code and one `Kill`
/// with the standard script-failure message.
#[tokio::test]
async fn failing_script_with_fail_on_error_kills_the_task() {
    let script = ScriptSpec {
        command: "reload.sh".to_string(),
        args: vec![],
        timeout: Duration::from_secs(1),
        fail_on_error: true,
    };
    let sc = scenario(vec![spec("a", ChangeMode::Script(script))], ClientConfig::default()).await;
    sc.lifecycle.set_running(true);
    sc.lifecycle.set_exec_result(ttm_adapters::ExecResult {
        exit_code: 7,
        stdout: String::new(),
        stderr: String::new(),
    });

    let renderer = sc.renderer.clone();
    let runner = sc.runner.clone();
    let run = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    renderer.push_render_event(decision("a", true));
    tokio::time::sleep(Duration::from_millis(50)).await;
    run.abort();

    let events = sc.emitter.events();
    let failed = events.iter().find_map(|e| match e {
        TaskEvent::TaskHookFailed { message } => Some(message.clone()),
        _ => None,
    });
    assert!(
        failed.as_deref().is_some_and(|m| m.contains("exited with code: 7")),
        "expected a TaskHookFailed message, got {events:?}"
    );

    let calls = sc.lifecycle.calls();
    assert!(calls.iter().any(|c| matches!(
        c,
        LifecycleCall::Kill(TaskEvent::TaskKilling { message, fails_task: true })
            if message == "Template script failed, task is being killed"
    )));
}

/// Scenario 4: five missing dependencies; after one `MaxTemplateEventRate`
/// tick, exactly one telemetry event naming the first three (sorted) and
/// the remainder count.
#[tokio::test]
async fn five_missing_deps_are_truncated_to_three_plus_count() {
    let mut client = ClientConfig::default();
    client.max_template_event_rate = Duration::from_millis(60);
    let sc = scenario(vec![spec("a", ChangeMode::Noop)], client).await;

    let renderer = sc.renderer.clone();
    let emitter = sc.emitter.clone();
    let runner = sc.runner.clone();
    let run = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_millis(5)).await;
    let missing: std::collections::HashSet<String> =
        ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
    renderer.push_render_event(RenderChannelMsg::MissingDeps(MissingDeps(missing)));

    tokio::time::sleep(Duration::from_millis(90)).await;
    renderer.push_render_event(decision("a", false));

    tokio::time::timeout(Duration::from_millis(500), run)
        .await
        .expect("run should return")
        .unwrap()
        .unwrap();

    let events = emitter.events();
    let missing_events: Vec<&String> = events
        .iter()
        .filter_map(|e| match e {
            TaskEvent::TaskMissingDeps { message } => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(missing_events.len(), 1);
    assert_eq!(missing_events[0], "Missing: a, b, c, and 2 more");
}

/// Scenario 5: a destination outside the sandbox with sandboxing enabled;
/// expect construction to fail with a sandbox-escape error and no renderer
/// to have ever been started.
#[tokio::test]
async fn destination_outside_sandbox_fails_construction() {
    let mut bad = spec("a", ChangeMode::Noop);
    bad.destination = PathBuf::from("../../etc/passwd");

    let lifecycle = FakeTaskLifecycle::new();
    let emitter = FakeEventEmitter::new();
    let env_builder = FakeEnvironmentBuilder::new();
    let renderer = FakeTemplateRenderer::new();
    let handle = renderer.handle();

    let err = TemplateRunner::new(TemplateRunnerConfig {
        specs: vec![bad],
        client: ClientConfig::default(),
        consul: ConsulDirectives::default(),
        vault: VaultDirectives::default(),
        nomad: NomadDirectives::default(),
        agent_namespace: None,
        lifecycle: Arc::new(lifecycle),
        emitter,
        env_builder,
        renderer,
    })
    .await
    .expect_err("construction should fail on a sandbox-escaping destination");

    assert!(matches!(err, ttm_core::ConfigError::SandboxEscapeDestination(_)));
    assert!(handle.start_calls().is_empty());
}

/// An unparseable change-signal name must fail construction (§3 invariant
/// 2) before the renderer is ever started.
#[tokio::test]
async fn unparseable_signal_name_fails_construction() {
    let bad = spec("a", ChangeMode::Signal("NOT_A_REAL_SIGNAL".to_string()));

    let lifecycle = FakeTaskLifecycle::new();
    let emitter = FakeEventEmitter::new();
    let env_builder = FakeEnvironmentBuilder::new();
    let renderer = FakeTemplateRenderer::new();
    let handle = renderer.handle();

    let err = TemplateRunner::new(TemplateRunnerConfig {
        specs: vec![bad],
        client: ClientConfig::default(),
        consul: ConsulDirectives::default(),
        vault: VaultDirectives::default(),
        nomad: NomadDirectives::default(),
        agent_namespace: None,
        lifecycle: Arc::new(lifecycle),
        emitter,
        env_builder,
        renderer,
    })
    .await
    .expect_err("construction should fail on an unparseable signal name");

    assert!(matches!(err, ttm_core::ConfigError::BadSignal(_)));
    assert!(handle.start_calls().is_empty());
}

/// Scenario 6: gate with an already-running task and two dirty templates,
/// one signal and one restart; on gate release the dispatcher replays the
/// dirty batch immediately and restart wins.
#[tokio::test]
async fn already_running_task_replays_dirty_batch_as_restart_on_gate_release() {
    let specs = vec![
        spec("a", ChangeMode::Signal("SIGHUP".to_string())),
        spec("b", ChangeMode::Restart),
    ];
    let sc = scenario(specs, ClientConfig::default()).await;
    sc.lifecycle.set_running(true);

    let renderer = sc.renderer.clone();
    let runner = sc.runner.clone();
    let run = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    // Both templates already wrote to disk during the gate itself — this
    // is the "already running at gate time" dirty-replay path, not the
    // steady-state dispatcher.
    renderer.push_render_event(decision("a", true));
    renderer.push_render_event(decision("b", true));

    tokio::time::sleep(Duration::from_millis(50)).await;
    run.abort();

    let calls = sc.lifecycle.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], LifecycleCall::Restart(_)));
}

/// Boundary: zero templates unblocks immediately without starting the
/// renderer.
#[tokio::test]
async fn zero_templates_unblocks_without_starting_renderer() {
    let sc = scenario(Vec::new(), ClientConfig::default()).await;
    let mut unblock = sc.runner.unblock_rx();

    sc.runner.run().await.unwrap();

    assert!(*unblock.borrow_and_update());
    assert!(sc.renderer.start_calls().is_empty());
}

/// Boundary: `once` mixed across a template set is a construction error.
#[tokio::test]
async fn mixed_once_mode_fails_construction() {
    let mut a = spec("a", ChangeMode::Noop);
    a.once = true;
    let b = spec("b", ChangeMode::Noop);

    let lifecycle = FakeTaskLifecycle::new();
    let emitter = FakeEventEmitter::new();
    let env_builder = FakeEnvironmentBuilder::new();
    let renderer = FakeTemplateRenderer::new();

    let err = TemplateRunner::new(TemplateRunnerConfig {
        specs: vec![a, b],
        client: ClientConfig::default(),
        consul: ConsulDirectives::default(),
        vault: VaultDirectives::default(),
        nomad: NomadDirectives::default(),
        agent_namespace: None,
        lifecycle: Arc::new(lifecycle),
        emitter,
        env_builder,
        renderer,
    })
    .await
    .expect_err("mixed once across the set should fail construction");

    assert!(matches!(err, ttm_core::ConfigError::BadConfig(_)));
}

/// Env masking (§8 invariant 8): the renderer's config carries every
/// task-declared variable verbatim, and an explicit empty string for a
/// process variable the task never declared — never the ambient value.
#[tokio::test]
async fn renderer_config_masks_undeclared_process_vars() {
    std::env::set_var("TTM_SPEC_TEST_AMBIENT_SECRET", "leaked-if-unmasked");

    let mut task_vars = std::collections::HashMap::new();
    task_vars.insert("NAME".to_string(), "web".to_string());
    let env_builder = ttm_adapters::FakeEnvironmentBuilder::with_vars(PathBuf::from("/task"), task_vars);

    let lifecycle = FakeTaskLifecycle::new();
    let emitter = FakeEventEmitter::new();
    let renderer = FakeTemplateRenderer::new();
    let handle = renderer.handle();

    let runner = TemplateRunner::new(TemplateRunnerConfig {
        specs: vec![spec("a", ChangeMode::Noop)],
        client: ClientConfig::default(),
        consul: ConsulDirectives::default(),
        vault: VaultDirectives::default(),
        nomad: NomadDirectives::default(),
        agent_namespace: None,
        lifecycle: Arc::new(lifecycle),
        emitter,
        env_builder,
        renderer,
    })
    .await
    .expect("construction should succeed");

    let runner = Arc::new(runner);
    let run_handle = runner.clone();
    let run = tokio::spawn(async move { run_handle.run().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    handle.push_render_event(decision("a", false));
    tokio::time::timeout(Duration::from_millis(500), run)
        .await
        .expect("run should return")
        .unwrap()
        .unwrap();

    let configs = handle.start_calls();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].env.get("NAME"), Some(&"web".to_string()));
    assert_eq!(
        configs[0].env.get("TTM_SPEC_TEST_AMBIENT_SECRET"),
        Some(&String::new()),
        "undeclared process var must be masked to empty, not leaked"
    );

    std::env::remove_var("TTM_SPEC_TEST_AMBIENT_SECRET");
}

/// `Stop()` is idempotent and safe to call from a task other than the one
/// driving `run()`.
#[tokio::test]
async fn stop_unblocks_a_run_still_waiting_in_the_gate_and_is_idempotent() {
    let sc = scenario(vec![spec("a", ChangeMode::Noop)], ClientConfig::default()).await;
    let runner = sc.runner.clone();
    let stopper = sc.runner.clone();

    let run = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    stopper.stop().await;
    stopper.stop().await;

    let result = tokio::time::timeout(Duration::from_millis(200), run)
        .await
        .expect("stop() should unblock the gate promptly")
        .unwrap();
    assert!(result.is_ok());
    assert!(sc.renderer.is_stopped());
}
