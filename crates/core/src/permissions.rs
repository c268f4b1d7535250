// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Octal file-permission parsing for `TemplateSpec::perms`.

use crate::error::ConfigError;

/// Parse a permissions string as base-8, matching `chmod`'s own octal
/// convention (`"0644"`, `"644"`, or `"4755"` for the setuid bit are all
/// accepted; a 12-bit range covers setuid/setgid/sticky plus rwxrwxrwx).
pub fn parse_permissions(raw: &str) -> Result<u32, ConfigError> {
    let parsed = u32::from_str_radix(raw, 8)
        .map_err(|e| ConfigError::BadPermissions(raw.to_string(), e.to_string()))?;
    if parsed > 0o7777 {
        return Err(ConfigError::BadPermissions(
            raw.to_string(),
            "value exceeds 12-bit permission range".to_string(),
        ));
    }
    Ok(parsed)
}

#[cfg(test)]
#[path = "permissions_tests.rs"]
mod tests;
