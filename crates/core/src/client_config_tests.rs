// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_event_rate_is_three_seconds() {
    let c = ClientConfig::default();
    assert_eq!(c.max_template_event_rate, Duration::from_secs(3));
}

#[test]
fn rejects_zero_event_rate() {
    let mut c = ClientConfig::default();
    c.max_template_event_rate = Duration::ZERO;
    assert!(c.validate().is_err());
}

#[test]
fn deserializes_partial_json_with_defaults() {
    let c: ClientConfig = serde_json::from_str(r#"{"disable_sandbox": true}"#).unwrap();
    assert!(c.disable_sandbox);
    assert_eq!(c.max_template_event_rate, Duration::from_secs(3));
}

#[test]
fn default_splay_is_five_seconds() {
    let c = ClientConfig::default();
    assert_eq!(c.splay, Duration::from_secs(5));
}

#[test]
fn rejects_inverted_global_wait_bounds() {
    let mut c = ClientConfig::default();
    c.wait_bounds = WaitConfig::new(Duration::from_secs(10), Duration::from_secs(1));
    let err = c.validate().unwrap_err();
    assert!(matches!(err, ConfigError::WaitInvalid { .. }));
}

#[test]
fn disabled_wait_bounds_skip_the_min_max_check() {
    let c = ClientConfig::default();
    assert!(c.wait_bounds.validate().is_ok());
    assert!(c.validate().is_ok());
}
