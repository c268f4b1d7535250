// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event emitter collaborator: where `TaskEvent` telemetry goes. The TTM
//! never inspects whether the emit landed anywhere durable — it is pure
//! notification, distinct from the lifecycle calls that actually change
//! task state.

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeEventEmitter;

use async_trait::async_trait;
use ttm_core::TaskEvent;

/// Collaborator that records/forwards task events.
#[async_trait]
pub trait EventEmitter: Clone + Send + Sync + 'static {
    async fn emit(&self, event: TaskEvent);
}
