// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data model shared by every Task Template Manager crate: the declared
//! template spec, the small value types it's built from, and the
//! construction-time error type. No I/O, no async runtime — those live in
//! `ttm-adapters` and `ttm-engine`.

pub mod change_mode;
pub mod client_config;
pub mod error;
pub mod id;
pub mod permissions;
pub mod render_event;
pub mod signal;
pub mod store_config;
pub mod task_event;
pub mod template_spec;
pub mod wait;

pub use change_mode::{ChangeMode, ScriptSpec};
pub use client_config::ClientConfig;
pub use error::ConfigError;
pub use id::TemplateId;
pub use permissions::parse_permissions;
pub use render_event::{MissingDeps, RenderEvent};
pub use signal::{parse_signal_name, SignalToken, UnknownSignalError};
pub use store_config::{
    parse_basic_auth, BasicAuth, ConsulConfig, NomadConfig, RetryConfig, TlsConfig, VaultConfig,
};
pub use task_event::TaskEvent;
pub use template_spec::{validate_set, TemplateSpec};
pub use wait::WaitConfig;
