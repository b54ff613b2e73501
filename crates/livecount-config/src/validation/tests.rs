//! Tests for the full validation pipeline.

use super::*;

#[test]
fn default_config_validates() {
    let config = LivecountConfig::default();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_port_zero() {
    let mut config = LivecountConfig::default();
    config.server.port = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("server.port"));
}

#[test]
fn catches_empty_host() {
    let mut config = LivecountConfig::default();
    config.server.host = "  ".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("server.host"));
}

#[test]
fn catches_empty_origin_entry() {
    let mut config = LivecountConfig::default();
    config.server.allowed_origins.push(String::new());
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("server.allowed_origins"));
}

#[test]
fn catches_zero_outbound_buffer() {
    let mut config = LivecountConfig::default();
    config.transport.outbound_buffer = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("transport.outbound_buffer"));
}

#[test]
fn catches_idle_timeout_not_above_heartbeat() {
    let mut config = LivecountConfig::default();
    config.transport.heartbeat_interval = 30;
    config.transport.idle_timeout = 30;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("transport.idle_timeout"));
}

#[test]
fn catches_tiny_frame_limit() {
    let mut config = LivecountConfig::default();
    config.transport.max_frame_bytes = 8;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("transport.max_frame_bytes"));
}

#[test]
fn stats_interval_zero_is_allowed() {
    let mut config = LivecountConfig::default();
    config.stats.interval = 0;
    assert!(validate(&config).is_ok());
}

#[test]
fn collects_multiple_errors() {
    let mut config = LivecountConfig::default();
    config.server.port = 0;
    config.transport.outbound_buffer = 0;
    config.logging.level = String::new();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("server.port"));
    assert!(err.contains("transport.outbound_buffer"));
    assert!(err.contains("logging.level"));
}
