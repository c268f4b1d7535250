// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering engine collaborator: the external consumer/template engine
//! that actually resolves template dependencies and writes destinations.
//! The TTM only assembles its config and reacts to what comes back on its
//! four channels (error, rendered, render-event, done) — it never parses a
//! template or resolves a variable itself.

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTemplateRenderer, FakeTemplateRendererHandle};

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use ttm_core::{ConsulConfig, MissingDeps, NomadConfig, RenderEvent, TemplateId, VaultConfig, WaitConfig};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RendererError {
    #[error("renderer failed to start: {0}")]
    StartFailed(String),
    #[error("renderer runtime error: {0}")]
    Runtime(String),
}

/// One translated template, as the runner-config builder hands it to the
/// renderer. Distinct from `ttm_core::TemplateSpec`: perms are pre-resolved
/// to `u32` and the destination has already passed the sandbox check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedTemplate {
    pub id: TemplateId,
    pub source: Option<PathBuf>,
    pub embedded_content: Option<String>,
    pub destination: PathBuf,
    pub perms: Option<u32>,
    pub left_delimiter: Option<String>,
    pub right_delimiter: Option<String>,
    pub error_on_missing_key: bool,
    pub wait: WaitConfig,
    /// Mirrors `TemplateSpec::env` — the env harvester rebuilds its source
    /// list from the already-sandbox-checked translated set rather than
    /// re-filtering the original specs.
    pub env: bool,
    /// Resolved owner, present only when the spec declared a non-negative
    /// uid/gid — see `TemplateSpec::resolved_uid`/`resolved_gid`.
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    /// Template functions this descriptor's renderer must refuse,
    /// inherited verbatim from `ClientConfig::function_denylist` (§4.1).
    pub function_denylist: HashSet<String>,
}

/// Fully assembled configuration for one renderer run, built by the
/// runner-config builder from a task's validated template set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    pub templates: Vec<TranslatedTemplate>,
    pub consul: Option<ConsulConfig>,
    pub vault: Option<VaultConfig>,
    pub nomad: Option<NomadConfig>,
    pub wait: WaitConfig,
    pub max_stale: Option<Duration>,
    pub block_query_wait_time: Option<Duration>,
    /// Render-and-exit posture, shared by the whole template set.
    pub once: bool,
    /// The masked environment the renderer's own template functions (e.g.
    /// `env "X"`) observe. Every task-declared variable, plus an explicit
    /// empty entry for every process-environment variable the task did not
    /// declare — the sandboxing contract that forbids the renderer from
    /// ever observing an ambient value the task never opted into.
    pub env: HashMap<String, String>,
}

/// A render-decision update for one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderEventNotice {
    pub id: TemplateId,
    pub event: RenderEvent,
}

/// What can arrive on the renderer's general render-event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderChannelMsg {
    Decision(RenderEventNotice),
    MissingDeps(MissingDeps),
}

/// The four independent output channels a running renderer hands back from
/// `start`. Owned receivers rather than methods on the renderer itself, so
/// a caller can `tokio::select!` over all four concurrently without ever
/// needing more than one live borrow of the renderer at a time.
pub struct RendererEvents {
    pub errors: mpsc::UnboundedReceiver<RendererError>,
    pub rendered: mpsc::UnboundedReceiver<TemplateId>,
    pub render_events: mpsc::UnboundedReceiver<RenderChannelMsg>,
    pub done: mpsc::UnboundedReceiver<()>,
}

/// The external rendering engine's lifecycle.
///
/// `start` hands back the channels the renderer will push to for the
/// remainder of this run; the renderer itself is only touched again to
/// `stop` it.
#[async_trait]
pub trait TemplateRenderer: Send + Sync + 'static {
    async fn start(&mut self, config: RendererConfig) -> Result<RendererEvents, RendererError>;

    async fn stop(&mut self);
}
