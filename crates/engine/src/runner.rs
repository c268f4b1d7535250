// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-task supervisor tying C1–C7 together.
//!
//! `TemplateRunner` is generic over its four collaborators rather than
//! boxing them as `dyn Trait`: `EventEmitter: Clone` is not object-safe, so
//! the cheapest way to keep every collaborator uniform is a single set of
//! type parameters threaded through construction, `run`, and `stop`.

use crate::env_harvester::{EnvHarvester, HarvestError};
use crate::gate::FirstRenderGate;
use crate::runner_config::{self, ConsulDirectives, NomadDirectives, RunnerConfigInput, VaultDirectives};
use crate::script_executor;
use crate::signal_table::{BatchAction, SignalTable};
use crate::translator;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use ttm_adapters::{
    EnvironmentBuilder, EventEmitter, RenderChannelMsg, RendererConfig, RendererEvents,
    TaskLifecycle, TemplateRenderer,
};
use ttm_core::{
    ClientConfig, ConfigError, RenderEvent, TaskEvent, TemplateId, TemplateSpec,
};

/// Everything needed to construct one task's `TemplateRunner`.
pub struct TemplateRunnerConfig<L, Em, EnvB, R> {
    pub specs: Vec<TemplateSpec>,
    pub client: ClientConfig,
    pub consul: ConsulDirectives,
    pub vault: VaultDirectives,
    pub nomad: NomadDirectives,
    pub agent_namespace: Option<String>,
    pub lifecycle: Arc<L>,
    pub emitter: Em,
    pub env_builder: EnvB,
    pub renderer: R,
}

/// Draw a uniformly random delay in `[0, max_splay)`, satisfying §4.5's
/// "sleep a uniformly random duration in `[0, splay)` using a
/// nanosecond-resolution RNG" rule. `max_splay = 0` is handled by the
/// caller (splaying is skipped entirely), so this only ever samples a
/// strictly positive range.
fn splay_delay(max_splay: Duration) -> Duration {
    use rand::Rng;
    let nanos = max_splay.as_nanos().min(u128::from(u64::MAX));
    let sampled: u64 = rand::rng().random_range(0..nanos as u64);
    Duration::from_nanos(sampled)
}

enum GateOutcome {
    ShuttingDown,
    Opened {
        dirty_events: HashMap<TemplateId, RenderEvent>,
    },
}

enum DispatchOutcome {
    Continue,
    Fatal,
}

pub struct TemplateRunner<L, Em, EnvB, R> {
    lifecycle: Arc<L>,
    emitter: Em,
    env_builder: EnvB,
    /// Behind a mutex (rather than requiring `&mut self` on `run`/`stop`) so
    /// a caller can hand the task's kill-path an idempotent `Stop()` it can
    /// invoke concurrently with the task running `run()` on its own task —
    /// the two are driven from different places in a real host process.
    renderer: tokio::sync::Mutex<R>,

    config: RendererConfig,
    signal_table: SignalTable,
    gate: FirstRenderGate,
    harvester: EnvHarvester,
    splay_by_id: HashMap<TemplateId, Duration>,
    known_ids: HashSet<TemplateId>,
    all_noop: bool,
    max_template_event_rate: Duration,

    cancel: CancellationToken,
    stopped: tokio::sync::Mutex<bool>,
    unblock_tx: watch::Sender<bool>,
    unblock_rx: watch::Receiver<bool>,
}

impl<L, Em, EnvB, R> TemplateRunner<L, Em, EnvB, R>
where
    L: TaskLifecycle,
    Em: EventEmitter,
    EnvB: EnvironmentBuilder,
    R: TemplateRenderer,
{
    pub async fn new(input: TemplateRunnerConfig<L, Em, EnvB, R>) -> Result<Self, ConfigError> {
        let TemplateRunnerConfig {
            specs,
            client,
            consul,
            vault,
            nomad,
            agent_namespace,
            lifecycle,
            emitter,
            env_builder,
            renderer,
        } = input;

        client.validate()?;

        let task_env = env_builder
            .build()
            .await
            .map_err(|e| ConfigError::BadConfig(e.to_string()))?;

        let translated = translator::translate(
            &specs,
            &task_env,
            client.disable_sandbox,
            &client.function_denylist,
        )?;

        let once = specs.first().map(|s| s.once).unwrap_or(false);
        let all_noop = specs.iter().all(|s| s.change_mode.is_noop());

        let consul_cfg = runner_config::build_consul(&consul, agent_namespace.as_deref())?;
        let vault_cfg = runner_config::build_vault(&vault, agent_namespace.as_deref())?;
        let nomad_cfg = runner_config::build_nomad(&nomad)?;

        let known_ids: HashSet<TemplateId> = specs.iter().map(|s| s.id.clone()).collect();
        // A destination's id can be shared by more than one declared spec;
        // the batch's splay is the max across every affected template, so
        // the per-id splay used to seed that max is itself the largest any
        // co-located spec declares for this id.
        let mut splay_by_id: HashMap<TemplateId, Duration> = HashMap::new();
        for s in &specs {
            let entry = splay_by_id.entry(s.id.clone()).or_insert(Duration::ZERO);
            *entry = (*entry).max(s.splay);
        }
        let signal_table = SignalTable::build(&specs)?;
        let gate = FirstRenderGate::new(known_ids.iter().cloned());

        let env_sources: Vec<(TemplateId, PathBuf)> = translated
            .iter()
            .filter(|t| t.env)
            .map(|t| (t.id.clone(), t.destination.clone()))
            .collect();
        let harvester = EnvHarvester::new(env_sources);

        let max_template_event_rate = client.max_template_event_rate;

        let input = RunnerConfigInput {
            templates: translated,
            consul: consul_cfg,
            vault: Some(vault_cfg),
            nomad: nomad_cfg,
            once,
            task_env: task_env.all().clone(),
        };
        let config = runner_config::build(input, &client);

        let (unblock_tx, unblock_rx) = watch::channel(false);

        Ok(Self {
            lifecycle,
            emitter,
            env_builder,
            renderer: tokio::sync::Mutex::new(renderer),
            config,
            signal_table,
            gate,
            harvester,
            splay_by_id,
            known_ids,
            all_noop,
            max_template_event_rate,
            cancel: CancellationToken::new(),
            stopped: tokio::sync::Mutex::new(false),
            unblock_tx,
            unblock_rx,
        })
    }

    /// Resolves once the task's declared templates have all reached an
    /// initial render decision and the harvested env has been published.
    /// Clones cheaply so a caller can hand it to whoever starts the task's
    /// main process without also handing over the runner itself.
    pub fn unblock_rx(&self) -> watch::Receiver<bool> {
        self.unblock_rx.clone()
    }

    /// Idempotent shutdown: the first call closes the shutdown token and
    /// stops the rendering engine; every later call is a no-op. The engine
    /// is deliberately left running across every other exit path out of
    /// `run` so dynamic secrets keep renewing during the task's own
    /// kill-timeout window.
    pub async fn stop(&self) {
        let mut stopped = self.stopped.lock().await;
        if *stopped {
            return;
        }
        *stopped = true;
        self.cancel.cancel();
        self.renderer.lock().await.stop().await;
    }

    pub async fn run(&self) -> Result<(), crate::error::RunError> {
        if self.known_ids.is_empty() {
            let _ = self.unblock_tx.send(true);
            return Ok(());
        }

        let span = tracing::info_span!("template_runner_run", templates = self.known_ids.len());
        let _guard = span.enter();

        let mut events = match self.renderer.lock().await.start(self.config.clone()).await {
            Ok(events) => events,
            Err(err) => {
                tracing::error!(error = %err, "rendering engine failed to start");
                self.lifecycle
                    .kill(TaskEvent::kill(err.to_string(), true))
                    .await
                    .ok();
                return Err(err.into());
            }
        };

        let dirty_events = match self.run_gate(&mut events).await {
            GateOutcome::ShuttingDown => return Ok(()),
            GateOutcome::Opened { dirty_events } => dirty_events,
        };

        if self.cancel.is_cancelled() {
            return Ok(());
        }

        if self.lifecycle.is_running().await && !dirty_events.is_empty() {
            let replay: Vec<(TemplateId, RenderEvent)> = dirty_events.into_iter().collect();
            let mut handled_renders = HashMap::new();
            if let DispatchOutcome::Fatal = self
                .dispatch_batch_events(&replay, &mut handled_renders, SystemTime::UNIX_EPOCH)
                .await
            {
                return Ok(());
            }
        }

        if let Err(e) = self.harvest_and_publish().await {
            tracing::error!(error = %e, "env harvest failed after gate");
            self.lifecycle
                .kill(TaskEvent::kill(
                    format!("Template failed to read environment variables: {e}"),
                    true,
                ))
                .await
                .ok();
            return Ok(());
        }
        let _ = self.unblock_tx.send(true);

        if self.all_noop {
            tracing::debug!("every template is noop mode, skipping dispatch loop");
            return Ok(());
        }

        self.run_dispatch_loop(&mut events).await;
        Ok(())
    }

    async fn run_gate(&self, events: &mut RendererEvents) -> GateOutcome {
        let mut missing_set: Option<HashSet<String>> = None;
        let mut dirty_events: HashMap<TemplateId, RenderEvent> = HashMap::new();

        // One-shot deadline for the next missing-dep telemetry event, per
        // §4.4's `eventTimer`: armed only by the first change in
        // `missing_set` since the last emission (`outstandingEvent`'s
        // false->true edge) and disarmed once it fires, never recurring
        // on its own — a steady, unchanging missing set must produce
        // exactly one event, not one every `max_template_event_rate`
        // forever.
        let mut deadline: Option<tokio::time::Instant> = None;

        loop {
            let timer_wait = async {
                match deadline {
                    Some(d) => tokio::time::sleep_until(d).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = self.cancel.cancelled() => return GateOutcome::ShuttingDown,
                // `FirstRenderGate::wait()` resolves the instant every
                // known id has recorded a decision; racing it alongside the
                // channel arms below means the loop returns as soon as the
                // last `record_decision` call below flips the gate open,
                // without a separate `is_open()` poll.
                _ = self.gate.wait() => return GateOutcome::Opened { dirty_events },
                Some(err) = events.errors.recv() => {
                    tracing::error!(error = %err, "rendering engine error during gate");
                    self.lifecycle
                        .kill(TaskEvent::kill(err.to_string(), true))
                        .await
                        .ok();
                }
                Some(msg) = events.render_events.recv() => {
                    match msg {
                        RenderChannelMsg::Decision(notice) => {
                            if notice.event.has_decided() {
                                self.gate.record_decision(&notice.id);
                                if !notice.event.did_render_is_zero() {
                                    dirty_events.insert(notice.id.clone(), notice.event);
                                }
                            }
                        }
                        RenderChannelMsg::MissingDeps(deps) => {
                            let set = deps.0;
                            if missing_set.as_ref() != Some(&set) {
                                missing_set = Some(set);
                                if deadline.is_none() {
                                    deadline = Some(tokio::time::Instant::now() + self.max_template_event_rate);
                                }
                            }
                        }
                    }
                }
                _ = timer_wait, if deadline.is_some() => {
                    if let Some(set) = &missing_set {
                        self.emit_missing_deps(set).await;
                    }
                    deadline = None;
                }
            }
        }
    }

    async fn run_dispatch_loop(&self, events: &mut RendererEvents) {
        let gate_exit_time = SystemTime::now();
        let mut handled_renders: HashMap<TemplateId, SystemTime> = HashMap::new();
        let mut dispatcher = crate::dispatcher::ReRenderDispatcher::new();
        let mut latest: HashMap<TemplateId, RenderEvent> = HashMap::new();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                Some(()) = events.done.recv() => {}
                Some(err) = events.errors.recv() => {
                    tracing::error!(error = %err, "rendering engine error during dispatch");
                    self.lifecycle
                        .kill(TaskEvent::kill(err.to_string(), true))
                        .await
                        .ok();
                }
                // The renderer's separate per-write notification; the actual
                // dispatch trigger is the timestamped event below; this arm
                // only keeps the channel draining so it never backs up.
                Some(_) = events.rendered.recv() => {}
                Some(msg) = events.render_events.recv() => {
                    self.record_decision(msg, &mut latest, &mut dispatcher);
                    // Drain whatever else has already queued up so a burst of
                    // near-simultaneous writes lands in one batch instead of
                    // firing the dispatch pipeline once per decision. This is
                    // the only "collection window" — there is no separate
                    // timer, so the splay draw below stays the single delay.
                    while let Ok(msg) = events.render_events.try_recv() {
                        self.record_decision(msg, &mut latest, &mut dispatcher);
                    }

                    if dispatcher.has_pending() {
                        let ids = dispatcher.take_batch();
                        let batch: Vec<(TemplateId, RenderEvent)> = ids
                            .iter()
                            .filter_map(|id| latest.get(id).map(|e| (id.clone(), *e)))
                            .collect();
                        if let DispatchOutcome::Fatal = self
                            .dispatch_batch_events(&batch, &mut handled_renders, gate_exit_time)
                            .await
                        {
                            return;
                        }
                    }
                }
            }
        }
    }

    fn record_decision(
        &self,
        msg: RenderChannelMsg,
        latest: &mut HashMap<TemplateId, RenderEvent>,
        dispatcher: &mut crate::dispatcher::ReRenderDispatcher,
    ) {
        if let RenderChannelMsg::Decision(notice) = msg {
            latest.insert(notice.id.clone(), notice.event);
            if !notice.event.did_render_is_zero() {
                dispatcher.record_rendered(notice.id);
            }
        }
    }

    /// Applies the C5/C3/C6 pipeline to one batch of render decisions.
    /// `floor_time` implements the "first-pass gating" rule: any event no
    /// newer than it is recorded into `handled_renders` and skipped,
    /// without being treated as dirty. It is `UNIX_EPOCH` for the one-time
    /// gate-exit replay (so nothing is suppressed) and the real gate-exit
    /// instant for every call made from the steady-state loop afterward.
    async fn dispatch_batch_events(
        &self,
        batch: &[(TemplateId, RenderEvent)],
        handled_renders: &mut HashMap<TemplateId, SystemTime>,
        floor_time: SystemTime,
    ) -> DispatchOutcome {
        let mut handling: Vec<TemplateId> = Vec::new();
        let mut max_splay = Duration::ZERO;

        for (id, event) in batch {
            if floor_time >= event.last_did_render {
                handled_renders.insert(id.clone(), floor_time);
                continue;
            }
            if handled_renders
                .get(id)
                .is_some_and(|prev| *prev >= event.last_did_render)
            {
                continue;
            }

            if !self.known_ids.contains(id) {
                tracing::error!(id = %id, "rendering engine reported unknown template id");
                self.lifecycle
                    .kill(TaskEvent::kill(
                        format!("Template runner returned unknown template id {:?}", id.as_str()),
                        true,
                    ))
                    .await
                    .ok();
                return DispatchOutcome::Fatal;
            }

            if let Err(e) = self.harvest_and_publish().await {
                tracing::error!(error = %e, "env harvest failed during dispatch");
                self.lifecycle
                    .kill(TaskEvent::kill(
                        format!("Template failed to read environment variables: {e}"),
                        true,
                    ))
                    .await
                    .ok();
                return DispatchOutcome::Fatal;
            }

            if let Some(splay) = self.splay_by_id.get(id) {
                max_splay = max_splay.max(*splay);
            }
            handling.push(id.clone());
        }

        if handling.is_empty() {
            return DispatchOutcome::Continue;
        }

        let action = self.signal_table.classify(&handling);
        if matches!(action, BatchAction::Noop) {
            return DispatchOutcome::Continue;
        }

        if max_splay > Duration::ZERO {
            let delay = splay_delay(max_splay);
            tracing::debug!(
                splay_ms = max_splay.as_millis() as u64,
                delay_ms = delay.as_millis() as u64,
                "splaying batch"
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.cancel.cancelled() => return DispatchOutcome::Continue,
            }
        }

        for id in &handling {
            if let Some((_, event)) = batch.iter().find(|(eid, _)| eid == id) {
                handled_renders.insert(id.clone(), event.last_did_render);
            }
        }

        self.apply_action(action).await;
        DispatchOutcome::Continue
    }

    async fn apply_action(&self, action: BatchAction) {
        match action {
            BatchAction::Restart => {
                tracing::info!("template set re-rendered, restarting task");
                self.lifecycle
                    .restart(TaskEvent::TaskRestartSignal {
                        message: "Template with change_mode restart re-rendered".to_string(),
                    })
                    .await
                    .ok();
            }
            BatchAction::Apply { signals, scripts } => {
                if !signals.is_empty() {
                    self.deliver_signals(&signals).await;
                }
                if !scripts.is_empty()
                    && script_executor::run_batch(&scripts, &self.lifecycle, &self.emitter)
                        .await
                        .is_err()
                {
                    self.lifecycle
                        .kill(TaskEvent::kill(
                            "Template script failed, task is being killed".to_string(),
                            true,
                        ))
                        .await
                        .ok();
                }
            }
            BatchAction::Noop => {}
        }
    }

    async fn deliver_signals(&self, tokens: &[ttm_core::SignalToken]) {
        let mut failures = Vec::new();
        for token in tokens {
            let event = TaskEvent::TaskSignaling {
                message: "Template re-rendered".to_string(),
            };
            if let Err(e) = self.lifecycle.signal(token, event).await {
                failures.push(format!("{token}: {e}"));
            }
        }
        if !failures.is_empty() {
            let names: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
            tracing::error!(signals = %names.join(","), "signal delivery failed");
            self.lifecycle
                .kill(TaskEvent::kill(
                    format!(
                        "signal delivery failed for {}: {}",
                        names.join(", "),
                        failures.join("; ")
                    ),
                    true,
                ))
                .await
                .ok();
        }
    }

    async fn harvest_and_publish(&self) -> Result<(), HarvestError> {
        let vars = self.harvester.harvest_all()?;
        self.env_builder.set_template_env(vars).await;
        Ok(())
    }

    /// Missing-dep telemetry with the spec's truncation rule: beyond the
    /// first 3 (lexicographically sorted) names, collapse the remainder
    /// into a single `"and N more"` suffix.
    async fn emit_missing_deps(&self, set: &HashSet<String>) {
        let mut sorted: Vec<&str> = set.iter().map(String::as_str).collect();
        sorted.sort_unstable();

        let message = if sorted.len() > 3 {
            format!(
                "Missing: {}, and {} more",
                sorted[..3].join(", "),
                sorted.len() - 3
            )
        } else {
            format!("Missing: {}", sorted.join(", "))
        };

        tracing::warn!(missing = sorted.len(), "template dependencies unresolved");
        self.emitter
            .emit(TaskEvent::TaskMissingDeps { message })
            .await;
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
