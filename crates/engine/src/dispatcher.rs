// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C5 — Re-render Dispatcher batching.
//!
//! Buffers `TemplateId`s as they report a genuine new write into one
//! pending batch, coalescing whatever has already arrived on the
//! renderer's event channel into a single dispatch rather than acting on
//! each template one render at a time. This struct only ever tracks
//! *which* templates are pending — the random `[0, maxSplay)` jitter
//! §4.5 describes is a single delay applied once per batch, after it has
//! been classified (see `TemplateRunner::dispatch_batch_events`), not a
//! second wait spent collecting the batch in the first place.

use std::collections::HashSet;
use ttm_core::TemplateId;

pub struct ReRenderDispatcher {
    pending: HashSet<TemplateId>,
}

impl Default for ReRenderDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ReRenderDispatcher {
    pub fn new() -> Self {
        Self {
            pending: HashSet::new(),
        }
    }

    /// Record that `id` produced a new write.
    pub fn record_rendered(&mut self, id: TemplateId) {
        self.pending.insert(id);
    }

    pub fn take_batch(&mut self) -> Vec<TemplateId> {
        self.pending.drain().collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
