//! Live presence counting.
//!
//! Tracks which connections are present on which page, keeps a separate
//! set of connections that only watch a page's count, and fans count
//! updates out to each page's watchers. All state lives in one
//! [`PresenceEngine`] that is only reachable through a [`PresenceHub`].

pub mod broadcast;
pub mod engine;
pub mod hub;
pub mod protocol;
pub mod registry;
pub mod tables;

pub use broadcast::{BroadcastGateway, DeliveryReport};
pub use engine::{Audience, CountUpdate, Dispatch, PresenceEngine, PresenceStats};
pub use hub::PresenceHub;
pub use protocol::{ClientMessage, ServerMessage};
