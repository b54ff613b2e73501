use serde::{Deserialize, Serialize};

/// Per-connection transport tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Capacity of each connection's outbound queue. Updates for a full queue are dropped.
    pub outbound_buffer: u32,
    /// Seconds between server Ping frames.
    pub heartbeat_interval: u64,
    /// Seconds without any inbound frame before the connection is closed.
    pub idle_timeout: u64,
    /// Largest inbound text frame accepted, in bytes.
    pub max_frame_bytes: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: 256,
            heartbeat_interval: 25,
            idle_timeout: 60,
            max_frame_bytes: 4096,
        }
    }
}
