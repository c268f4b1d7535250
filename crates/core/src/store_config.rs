// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data shapes for the configuration-store (Consul), secret-store (Vault),
//! and cluster (Nomad) sections of the assembled rendering-engine config.
//!
//! These are pure data: the TTM never dials any of these services itself,
//! it only assembles the configuration an external rendering engine will
//! use to do so.

use crate::error::ConfigError;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attempts == 0 {
            return Err(ConfigError::BadConfig(
                "retry attempts must be nonzero".into(),
            ));
        }
        if self.backoff > self.max_backoff {
            return Err(ConfigError::BadConfig(
                "retry backoff exceeds max_backoff".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TlsConfig {
    pub ca_cert: Option<String>,
    pub cert: Option<String>,
    pub key: Option<String>,
    pub server_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// Parse a single `user:pass` string, as Consul's HTTP basic-auth option is
/// declared.
pub fn parse_basic_auth(raw: &str) -> Result<BasicAuth, ConfigError> {
    match raw.split_once(':') {
        Some((user, pass)) if !user.is_empty() => Ok(BasicAuth {
            username: user.to_string(),
            password: pass.to_string(),
        }),
        _ => Err(ConfigError::BadAuth(raw.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConsulConfig {
    pub address: Option<String>,
    pub token: String,
    pub namespace: Option<String>,
    pub tls: Option<TlsConfig>,
    pub auth: Option<BasicAuth>,
    pub retry: Option<RetryConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    pub address: Option<String>,
    pub token: String,
    pub namespace: Option<String>,
    pub tls: Option<TlsConfig>,
    pub retry: Option<RetryConfig>,
    /// Always false unless a task explicitly opts into renewal — the
    /// default must never renew a token it was never handed deliberately.
    pub renew_token: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        // Per the "no ambient leakage" contract: an uninitialized Vault
        // section carries no token and never renews, so a misconfigured
        // task can never accidentally inherit process-environment secrets.
        Self {
            address: None,
            token: String::new(),
            namespace: None,
            tls: None,
            retry: None,
            renew_token: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NomadConfig {
    pub namespace: Option<String>,
    pub token: Option<String>,
    pub retry: Option<RetryConfig>,
    pub has_custom_dialer: bool,
}

#[cfg(test)]
#[path = "store_config_tests.rs"]
mod tests;
