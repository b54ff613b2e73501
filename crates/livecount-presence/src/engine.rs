//! Presence engine: the only code that mutates membership and subscriptions.
//!
//! Every operation runs to completion against `&mut self` and returns the
//! count updates it produced, already resolved to concrete recipients.
//! Nothing here performs I/O; callers hand the result to a
//! [`BroadcastGateway`](crate::BroadcastGateway).

use livecount_common::{ConnectionId, PageId};
use tracing::debug;

use crate::registry::ConnectionRegistry;
use crate::tables::{MembershipTable, SubscriptionTable};

/// A page's count at the moment it was computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountUpdate {
    pub page: PageId,
    pub count: usize,
}

/// Who receives a [`CountUpdate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Snapshot of the page's subscriber set taken with the count.
    Subscribers(Vec<ConnectionId>),
    /// Only the connection that asked.
    Single(ConnectionId),
}

impl Audience {
    pub fn len(&self) -> usize {
        match self {
            Audience::Subscribers(ids) => ids.len(),
            Audience::Single(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        match self {
            Audience::Subscribers(ids) => ids.contains(id),
            Audience::Single(target) => target == id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub update: CountUpdate,
    pub audience: Audience,
}

/// Totals for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenceStats {
    pub connections: usize,
    pub pages: usize,
    pub joiners: usize,
    pub subscriptions: usize,
}

#[derive(Debug, Default)]
pub struct PresenceEngine {
    registry: ConnectionRegistry,
    members: MembershipTable,
    subscribers: SubscriptionTable,
}

impl PresenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Returns false if it was already known.
    pub fn connect(&mut self, id: &ConnectionId) -> bool {
        self.registry.on_connect(id)
    }

    /// Count `id` on `page`, moving it off any other page first.
    ///
    /// Returns the update for the page it left (if any) followed by the
    /// update for `page`. Joining the same page again changes nothing but
    /// still rebroadcasts the count.
    pub fn join(&mut self, id: &ConnectionId, page: PageId) -> Vec<Dispatch> {
        let Some(record) = self.registry.record(id) else {
            debug!(connection = %id, page = %page, "join from unregistered connection ignored");
            return Vec::new();
        };

        let mut dispatches = Vec::with_capacity(2);
        if record.joined_page.as_ref().is_some_and(|prev| *prev != page) {
            dispatches.extend(self.leave(id));
        }

        self.members.add_member(&page, id);
        self.subscribers.add_subscriber(&page, id);
        if let Some(record) = self.registry.record_mut(id) {
            record.joined_page = Some(page.clone());
        }

        let dispatch = self.broadcast(&page);
        debug!(connection = %id, page = %page, count = dispatch.update.count, "joined");
        dispatches.push(dispatch);
        dispatches
    }

    /// Subscribe `id` to `page` without counting it. The current count goes
    /// to `id` alone.
    pub fn monitor(&mut self, id: &ConnectionId, page: PageId) -> Option<Dispatch> {
        let Some(record) = self.registry.record_mut(id) else {
            debug!(connection = %id, page = %page, "monitor from unregistered connection ignored");
            return None;
        };
        record.monitored.insert(page.clone());
        self.subscribers.add_subscriber(&page, id);

        let count = self.members.count(&page);
        debug!(connection = %id, page = %page, count, "monitoring");
        Some(Dispatch {
            update: CountUpdate { page, count },
            audience: Audience::Single(id.clone()),
        })
    }

    /// Stop counting `id` on its joined page. `None` if it had no joined page.
    ///
    /// The subscription for that page is dropped too, unless `id` also
    /// monitors it.
    pub fn leave(&mut self, id: &ConnectionId) -> Option<Dispatch> {
        let record = self.registry.record_mut(id)?;
        let page = record.joined_page.take()?;
        let keep_subscription = record.monitored.contains(&page);

        self.members.remove_member(&page, id);
        if !keep_subscription {
            self.subscribers.remove_subscriber(&page, id);
        }

        let dispatch = self.broadcast(&page);
        debug!(connection = %id, page = %page, count = dispatch.update.count, "left");
        Some(dispatch)
    }

    /// Forget `id` entirely. Only its joined page (if any) gets an update;
    /// pages it merely monitored are cleaned up silently.
    pub fn disconnect(&mut self, id: &ConnectionId) -> Option<Dispatch> {
        let Some(record) = self.registry.on_disconnect(id) else {
            debug!(connection = %id, "disconnect for unknown connection ignored");
            return None;
        };

        for page in &record.monitored {
            self.subscribers.remove_subscriber(page, id);
        }

        let page = record.joined_page?;
        self.members.remove_member(&page, id);
        self.subscribers.remove_subscriber(&page, id);

        let dispatch = self.broadcast(&page);
        debug!(connection = %id, page = %page, count = dispatch.update.count, "disconnected");
        Some(dispatch)
    }

    pub fn count(&self, page: &PageId) -> usize {
        self.members.count(page)
    }

    pub fn subscribers(&self, page: &PageId) -> Vec<ConnectionId> {
        self.subscribers.subscribers(page)
    }

    pub fn is_subscribed(&self, page: &PageId, id: &ConnectionId) -> bool {
        self.subscribers.is_subscribed(page, id)
    }

    pub fn joined_page(&self, id: &ConnectionId) -> Option<&PageId> {
        self.registry.joined_page(id)
    }

    pub fn stats(&self) -> PresenceStats {
        PresenceStats {
            connections: self.registry.len(),
            // Every counted page is also subscribed to, so this covers both tables.
            pages: self.subscribers.pages(),
            joiners: self.members.total_members(),
            subscriptions: self.subscribers.total_subscriptions(),
        }
    }

    fn broadcast(&self, page: &PageId) -> Dispatch {
        Dispatch {
            update: CountUpdate {
                page: page.clone(),
                count: self.members.count(page),
            },
            audience: Audience::Subscribers(self.subscribers.subscribers(page)),
        }
    }
}
