// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C2 — assembles the `RendererConfig` handed to `TemplateRenderer::start`
//! from a task's translated templates, client-wide settings, and whichever
//! store configs (Consul/Vault/Nomad) the task declared.

use std::collections::HashMap;
use ttm_adapters::{RendererConfig, TranslatedTemplate};
use ttm_core::{
    parse_basic_auth, ClientConfig, ConfigError, ConsulConfig, NomadConfig, RetryConfig,
    TlsConfig, VaultConfig,
};

/// Everything needed to build one task's `RendererConfig`.
pub struct RunnerConfigInput {
    pub templates: Vec<TranslatedTemplate>,
    pub consul: Option<ConsulConfig>,
    pub vault: Option<VaultConfig>,
    pub nomad: Option<NomadConfig>,
    /// Render-and-exit posture, already confirmed uniform across the set
    /// by `translate`.
    pub once: bool,
    /// Task-declared environment, as assembled by the environment
    /// collaborator — the basis `mask_environment` masks the process
    /// environment against.
    pub task_env: HashMap<String, String>,
}

/// Build the environment map the rendering engine is started with: every
/// variable the task declared, plus an explicit empty string for every
/// variable present in the current process environment that the task did
/// not declare. This is the sandboxing contract in spec §4.2 — a template
/// function reading an undeclared host variable must see `""`, never the
/// ambient value, so the renderer's own environment lookups can never leak
/// a value the task never opted into.
pub fn mask_environment(task_env: &HashMap<String, String>) -> HashMap<String, String> {
    mask_against(task_env, std::env::vars())
}

/// `mask_environment`, parameterized over the "process environment" source
/// so tests never have to mutate real process env vars (which are global
/// and would race against every other test in the binary).
fn mask_against(
    task_env: &HashMap<String, String>,
    process_env: impl IntoIterator<Item = (String, String)>,
) -> HashMap<String, String> {
    let mut masked = task_env.clone();
    for (key, _) in process_env {
        masked.entry(key).or_insert_with(String::new);
    }
    masked
}

/// A task's declared Consul directives, before namespace inheritance and
/// TLS/auth parsing have been applied.
#[derive(Debug, Clone, Default)]
pub struct ConsulDirectives {
    pub enabled: bool,
    pub address: Option<String>,
    pub token: String,
    pub namespace: Option<String>,
    pub ssl_enabled: bool,
    pub tls: Option<TlsConfig>,
    /// Raw `user:pass`, as the task declares it.
    pub basic_auth: Option<String>,
    pub retry: Option<RetryConfig>,
}

/// A task's declared Vault directives.
#[derive(Debug, Clone, Default)]
pub struct VaultDirectives {
    pub enabled: bool,
    pub address: Option<String>,
    pub token: String,
    pub namespace: Option<String>,
    pub tls_cert_file: Option<String>,
    pub tls: Option<TlsConfig>,
    pub retry: Option<RetryConfig>,
    pub renew_token: bool,
}

/// A task's declared Nomad directives.
#[derive(Debug, Clone, Default)]
pub struct NomadDirectives {
    pub namespace: Option<String>,
    pub token: Option<String>,
    pub has_custom_dialer: bool,
    pub retry: Option<RetryConfig>,
}

/// Build the Consul section, or `None` when the task never declared one.
/// `agent_namespace` is the fallback inherited when the task leaves its own
/// namespace unset.
pub fn build_consul(
    task: &ConsulDirectives,
    agent_namespace: Option<&str>,
) -> Result<Option<ConsulConfig>, ConfigError> {
    if !task.enabled {
        return Ok(None);
    }

    if let Some(retry) = &task.retry {
        retry.validate()?;
    }

    let auth = task
        .basic_auth
        .as_deref()
        .map(parse_basic_auth)
        .transpose()?;

    let tls = if task.ssl_enabled {
        Some(task.tls.clone().unwrap_or_default())
    } else {
        None
    };

    Ok(Some(ConsulConfig {
        address: task.address.clone(),
        token: task.token.clone(),
        namespace: task.namespace.clone().or_else(|| agent_namespace.map(String::from)),
        tls,
        auth,
        retry: task.retry.clone(),
    }))
}

/// Build the Vault section. Unlike Consul and Nomad, this always produces a
/// config — an un-opted-in task still gets the "no ambient leakage"
/// default with an empty token and renewal disabled.
pub fn build_vault(
    task: &VaultDirectives,
    agent_namespace: Option<&str>,
) -> Result<VaultConfig, ConfigError> {
    if !task.enabled {
        return Ok(VaultConfig::default());
    }

    if let Some(retry) = &task.retry {
        retry.validate()?;
    }

    let wants_tls = task.tls_cert_file.is_some()
        || task
            .address
            .as_deref()
            .is_some_and(|a| a.starts_with("https://"));
    let tls = wants_tls.then(|| {
        let mut tls = task.tls.clone().unwrap_or_default();
        if tls.cert.is_none() {
            tls.cert = task.tls_cert_file.clone();
        }
        tls
    });

    Ok(VaultConfig {
        address: task.address.clone(),
        token: task.token.clone(),
        namespace: task.namespace.clone().or_else(|| agent_namespace.map(String::from)),
        tls,
        retry: task.retry.clone(),
        renew_token: task.renew_token,
    })
}

/// Build the Nomad section, or `None` when the task declares nothing at all.
pub fn build_nomad(task: &NomadDirectives) -> Result<Option<NomadConfig>, ConfigError> {
    if task.namespace.is_none() && task.token.is_none() && task.retry.is_none() {
        return Ok(None);
    }

    if let Some(retry) = &task.retry {
        retry.validate()?;
    }

    Ok(Some(NomadConfig {
        namespace: task.namespace.clone(),
        token: task.token.clone(),
        retry: task.retry.clone(),
        has_custom_dialer: task.has_custom_dialer,
    }))
}

/// Clamp every template's wait window into the client's global bounds and
/// assemble the final renderer config.
pub fn build(input: RunnerConfigInput, client: &ClientConfig) -> RendererConfig {
    let templates = input
        .templates
        .into_iter()
        .map(|mut t| {
            t.wait = t.wait.clamp_to(&client.wait_bounds);
            t
        })
        .collect();

    RendererConfig {
        templates,
        consul: input.consul,
        vault: input.vault,
        nomad: input.nomad,
        wait: client.wait_bounds,
        max_stale: client.max_stale,
        block_query_wait_time: client.block_query_wait_time,
        once: input.once,
        env: mask_environment(&input.task_env),
    }
}

#[cfg(test)]
#[path = "runner_config_tests.rs"]
mod tests;
