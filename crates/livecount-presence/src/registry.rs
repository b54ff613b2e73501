//! Connection registry: one record per live connection.

use std::collections::{HashMap, HashSet};

use livecount_common::{ConnectionId, PageId};

/// What the engine knows about one connection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    /// The page this connection is counted on, if any.
    pub joined_page: Option<PageId>,
    /// Pages this connection watches without being counted.
    pub monitored: HashSet<PageId>,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionRecord>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection with no joined page. Returns false if it was
    /// already registered, in which case its record is left untouched.
    pub fn on_connect(&mut self, id: &ConnectionId) -> bool {
        if self.connections.contains_key(id) {
            return false;
        }
        self.connections
            .insert(id.clone(), ConnectionRecord::default());
        true
    }

    /// Remove a connection and hand back its record. `None` for unknown ids.
    pub fn on_disconnect(&mut self, id: &ConnectionId) -> Option<ConnectionRecord> {
        self.connections.remove(id)
    }

    #[cfg(test)]
    pub(crate) fn is_registered(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn joined_page(&self, id: &ConnectionId) -> Option<&PageId> {
        self.connections.get(id)?.joined_page.as_ref()
    }

    pub fn record(&self, id: &ConnectionId) -> Option<&ConnectionRecord> {
        self.connections.get(id)
    }

    pub(crate) fn record_mut(&mut self, id: &ConnectionId) -> Option<&mut ConnectionRecord> {
        self.connections.get_mut(id)
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&ConnectionId, &ConnectionRecord)> {
        self.connections.iter()
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
