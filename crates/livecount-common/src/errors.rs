use std::path::PathBuf;

use crate::id::ConnectionId;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// An inbound frame the transport adapter could not turn into a presence event.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unsupported frame: {0}")]
    UnsupportedFrame(&'static str),

    #[error("frame too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },
}

/// A single failed delivery. Logged and dropped by the gateway, never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("connection {0} is closed")]
    Closed(ConnectionId),

    #[error("outbound queue for {0} is full")]
    Full(ConnectionId),

    #[error("connection {0} has no outbox")]
    Unknown(ConnectionId),
}

/// Failures that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum LivecountError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
