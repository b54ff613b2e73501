//! livecount configuration.
//!
//! TOML-based configuration for the presence server. All sections use
//! defaults so partial configs work out of the box.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{LivecountConfig, LoggingConfig, ServerConfig, StatsConfig, TransportConfig};

use std::path::Path;

use livecount_common::ConfigError;

/// Load config from `path`, or from the platform default location when `None`,
/// and reject it if validation fails.
pub fn load_config(path: Option<&Path>) -> Result<LivecountConfig, ConfigError> {
    let config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };
    validation::validate(&config)?;
    Ok(config)
}
