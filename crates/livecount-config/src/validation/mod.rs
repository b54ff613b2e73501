//! Full configuration validation.
//!
//! Every check pushes onto one error list so a bad file reports all of
//! its problems at once.

mod helpers;

#[cfg(test)]
mod tests;

use crate::schema::LivecountConfig;
use livecount_common::ConfigError;

use helpers::validate_range;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &LivecountConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push("server.host must not be empty".into());
    }
    validate_range(&mut errors, "server.port", config.server.port.into(), 1, 65535);
    for origin in &config.server.allowed_origins {
        if origin.trim().is_empty() {
            errors.push("server.allowed_origins contains an empty entry".into());
        }
    }

    let transport = &config.transport;
    validate_range(
        &mut errors,
        "transport.outbound_buffer",
        transport.outbound_buffer.into(),
        1,
        65536,
    );
    validate_range(
        &mut errors,
        "transport.heartbeat_interval",
        transport.heartbeat_interval,
        1,
        300,
    );
    validate_range(
        &mut errors,
        "transport.max_frame_bytes",
        transport.max_frame_bytes.into(),
        64,
        1_048_576,
    );
    if transport.idle_timeout <= transport.heartbeat_interval {
        errors.push(format!(
            "transport.idle_timeout = {} must be greater than transport.heartbeat_interval = {}",
            transport.idle_timeout, transport.heartbeat_interval
        ));
    }

    if config.logging.level.trim().is_empty() {
        errors.push("logging.level must not be empty".into());
    }

    validate_range(&mut errors, "stats.interval", config.stats.interval, 0, 86_400);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
