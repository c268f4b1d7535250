// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake event emitter for engine-level tests.

use super::EventEmitter;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use ttm_core::TaskEvent;

#[derive(Clone, Default)]
pub struct FakeEventEmitter {
    events: Arc<Mutex<Vec<TaskEvent>>>,
}

impl FakeEventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl EventEmitter for FakeEventEmitter {
    async fn emit(&self, event: TaskEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
