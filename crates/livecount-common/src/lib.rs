pub mod errors;
pub mod id;

pub use errors::{ConfigError, DeliveryError, LivecountError, ProtocolError};
pub use id::{new_id, ConnectionId, PageId};

pub type Result<T> = std::result::Result<T, LivecountError>;
