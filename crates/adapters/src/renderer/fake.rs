// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake rendering engine for engine-level tests.
//!
//! Exposes a `FakeTemplateRendererHandle` the test holds onto to push
//! events onto whichever of the four channels it wants, independently of
//! when `TemplateRunner` happens to be polling them. The handle is cloned
//! before `start` is called, since `start` moves the receiver halves out
//! to the caller.

use super::{RenderChannelMsg, RendererConfig, RendererError, RendererEvents, TemplateRenderer};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use ttm_core::TemplateId;

/// Handle a test keeps to drive a `FakeTemplateRenderer`'s channels and
/// inspect the configs it was started with.
#[derive(Clone)]
pub struct FakeTemplateRendererHandle {
    started_with: Arc<Mutex<Vec<RendererConfig>>>,
    error_tx: mpsc::UnboundedSender<RendererError>,
    rendered_tx: mpsc::UnboundedSender<TemplateId>,
    render_event_tx: mpsc::UnboundedSender<RenderChannelMsg>,
    done_tx: mpsc::UnboundedSender<()>,
    stopped: Arc<Mutex<bool>>,
}

impl FakeTemplateRendererHandle {
    pub fn push_error(&self, err: RendererError) {
        let _ = self.error_tx.send(err);
    }

    pub fn push_rendered(&self, id: TemplateId) {
        let _ = self.rendered_tx.send(id);
    }

    pub fn push_render_event(&self, msg: RenderChannelMsg) {
        let _ = self.render_event_tx.send(msg);
    }

    pub fn push_done(&self) {
        let _ = self.done_tx.send(());
    }

    pub fn start_calls(&self) -> Vec<RendererConfig> {
        self.started_with.lock().clone()
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.lock()
    }
}

/// Fake `TemplateRenderer`. Construct with `FakeTemplateRenderer::new()`
/// and clone its `handle()` before handing the renderer to the runner —
/// once `start` runs, the renderer itself only gets a `stop` call.
pub struct FakeTemplateRenderer {
    handle: FakeTemplateRendererHandle,
    channels: Option<(
        mpsc::UnboundedReceiver<RendererError>,
        mpsc::UnboundedReceiver<TemplateId>,
        mpsc::UnboundedReceiver<RenderChannelMsg>,
        mpsc::UnboundedReceiver<()>,
    )>,
}

impl FakeTemplateRenderer {
    pub fn new() -> Self {
        let (error_tx, error_rx) = mpsc::unbounded_channel();
        let (rendered_tx, rendered_rx) = mpsc::unbounded_channel();
        let (render_event_tx, render_event_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let handle = FakeTemplateRendererHandle {
            started_with: Arc::new(Mutex::new(Vec::new())),
            error_tx,
            rendered_tx,
            render_event_tx,
            done_tx,
            stopped: Arc::new(Mutex::new(false)),
        };
        Self {
            handle,
            channels: Some((error_rx, rendered_rx, render_event_rx, done_rx)),
        }
    }

    pub fn handle(&self) -> FakeTemplateRendererHandle {
        self.handle.clone()
    }
}

impl Default for FakeTemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplateRenderer for FakeTemplateRenderer {
    async fn start(&mut self, config: RendererConfig) -> Result<RendererEvents, RendererError> {
        self.handle.started_with.lock().push(config);
        let (errors, rendered, render_events, done) = self
            .channels
            .take()
            .expect("FakeTemplateRenderer::start called more than once");
        Ok(RendererEvents {
            errors,
            rendered,
            render_events,
            done,
        })
    }

    async fn stop(&mut self) {
        *self.handle.stopped.lock() = true;
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
