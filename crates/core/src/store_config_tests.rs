// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_user_pass() {
    let auth = parse_basic_auth("alice:secret").unwrap();
    assert_eq!(auth.username, "alice");
    assert_eq!(auth.password, "secret");
}

#[test]
fn password_may_contain_colons() {
    let auth = parse_basic_auth("alice:sec:ret").unwrap();
    assert_eq!(auth.password, "sec:ret");
}

#[test]
fn rejects_missing_colon() {
    assert!(parse_basic_auth("alice").is_err());
}

#[test]
fn rejects_empty_username() {
    assert!(parse_basic_auth(":secret").is_err());
}

#[test]
fn vault_default_has_no_ambient_token() {
    let v = VaultConfig::default();
    assert_eq!(v.token, "");
    assert!(!v.renew_token);
}

#[test]
fn retry_rejects_zero_attempts() {
    let r = RetryConfig {
        attempts: 0,
        backoff: Duration::from_secs(1),
        max_backoff: Duration::from_secs(10),
    };
    assert!(r.validate().is_err());
}

#[test]
fn retry_rejects_backoff_exceeding_max() {
    let r = RetryConfig {
        attempts: 3,
        backoff: Duration::from_secs(20),
        max_backoff: Duration::from_secs(10),
    };
    assert!(r.validate().is_err());
}

#[test]
fn retry_accepts_sane_bounds() {
    let r = RetryConfig {
        attempts: 3,
        backoff: Duration::from_secs(1),
        max_backoff: Duration::from_secs(10),
    };
    assert!(r.validate().is_ok());
}
