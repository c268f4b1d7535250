// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Trait contracts for the Task Template Manager's external collaborators:
//! task lifecycle, event emission, task environment, and the rendering
//! engine itself. No concrete production adapter lives here — the host
//! process supplies its own; this crate defines the seam and, behind
//! `test-support`, a fake for each.

pub mod emitter;
pub mod environment;
pub mod lifecycle;
pub mod renderer;

pub use emitter::EventEmitter;
pub use environment::{EnvError, EnvironmentBuilder, TaskEnv};
pub use lifecycle::{ExecResult, LifecycleError, TaskLifecycle};
pub use renderer::{
    RenderChannelMsg, RenderEventNotice, RendererConfig, RendererError, RendererEvents,
    TemplateRenderer, TranslatedTemplate,
};

#[cfg(any(test, feature = "test-support"))]
pub use emitter::FakeEventEmitter;
#[cfg(any(test, feature = "test-support"))]
pub use environment::FakeEnvironmentBuilder;
#[cfg(any(test, feature = "test-support"))]
pub use lifecycle::{FakeTaskLifecycle, LifecycleCall};
#[cfg(any(test, feature = "test-support"))]
pub use renderer::{FakeTemplateRenderer, FakeTemplateRendererHandle};
