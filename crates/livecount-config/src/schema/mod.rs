//! Configuration schema types for livecount.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod logging;
mod server;
mod transport;

pub use logging::*;
pub use server::*;
pub use transport::*;

use serde::{Deserialize, Serialize};

/// Root configuration for the livecount server.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LivecountConfig {
    pub server: ServerConfig,
    pub transport: TransportConfig,
    pub logging: LoggingConfig,
    pub stats: StatsConfig,
}
