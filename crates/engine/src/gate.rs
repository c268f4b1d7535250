// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C4 — First-Render Gate.
//!
//! Task startup blocks on `wait()` until every declared template has
//! reached a render decision (`RenderEvent::has_decided`) at least once.
//! The gate only ever opens once: a later re-render closing over the same
//! template set must never re-block a task that already passed its first
//! pass, so `wait()` is a no-op on every call after the first.

use std::collections::HashSet;
use tokio::sync::watch;
use ttm_core::TemplateId;

pub struct FirstRenderGate {
    pending: parking_lot::Mutex<HashSet<TemplateId>>,
    opened_tx: watch::Sender<bool>,
}

impl FirstRenderGate {
    pub fn new(ids: impl IntoIterator<Item = TemplateId>) -> Self {
        let pending: HashSet<TemplateId> = ids.into_iter().collect();
        let (opened_tx, _) = watch::channel(pending.is_empty());
        Self {
            pending: parking_lot::Mutex::new(pending),
            opened_tx,
        }
    }

    /// Record that `id` has reached a render decision. No-op once the gate
    /// has already opened.
    pub fn record_decision(&self, id: &TemplateId) {
        if *self.opened_tx.borrow() {
            return;
        }
        let mut pending = self.pending.lock();
        pending.remove(id);
        if pending.is_empty() {
            let _ = self.opened_tx.send(true);
        }
    }

    pub fn is_open(&self) -> bool {
        *self.opened_tx.borrow()
    }

    /// Resolve once every template has decided. Returns immediately if the
    /// gate is already open — using a `watch` channel rather than
    /// `Notify` here specifically so a decision landing between this
    /// method's open-check and its subscription can never be missed.
    pub async fn wait(&self) {
        let mut rx = self.opened_tx.subscribe();
        if *rx.borrow() {
            return;
        }
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
