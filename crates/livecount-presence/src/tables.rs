//! Per-page connection sets.
//!
//! Both tables are plain hash sets keyed by page. They never reject an
//! operation; the engine is responsible for keeping them consistent.
//! A page whose set becomes empty is dropped, so an absent page and an
//! empty one look the same to callers.

use std::collections::{HashMap, HashSet};

use livecount_common::{ConnectionId, PageId};

#[derive(Debug, Default)]
struct PageSets {
    sets: HashMap<PageId, HashSet<ConnectionId>>,
}

impl PageSets {
    fn insert(&mut self, page: &PageId, conn: &ConnectionId) -> bool {
        self.sets
            .entry(page.clone())
            .or_default()
            .insert(conn.clone())
    }

    fn remove(&mut self, page: &PageId, conn: &ConnectionId) -> bool {
        let Some(set) = self.sets.get_mut(page) else {
            return false;
        };
        let removed = set.remove(conn);
        if set.is_empty() {
            self.sets.remove(page);
        }
        removed
    }

    fn len_of(&self, page: &PageId) -> usize {
        self.sets.get(page).map_or(0, HashSet::len)
    }

    fn contains(&self, page: &PageId, conn: &ConnectionId) -> bool {
        self.sets.get(page).is_some_and(|set| set.contains(conn))
    }

    fn members(&self, page: &PageId) -> Vec<ConnectionId> {
        self.sets
            .get(page)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn pages(&self) -> usize {
        self.sets.len()
    }

    fn total(&self) -> usize {
        self.sets.values().map(HashSet::len).sum()
    }
}

/// Page -> connections counted as present on it.
#[derive(Debug, Default)]
pub struct MembershipTable {
    inner: PageSets,
}

impl MembershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&mut self, page: &PageId, conn: &ConnectionId) -> bool {
        self.inner.insert(page, conn)
    }

    pub fn remove_member(&mut self, page: &PageId, conn: &ConnectionId) -> bool {
        self.inner.remove(page, conn)
    }

    /// Live count for `page`. Zero when nobody is joined.
    pub fn count(&self, page: &PageId) -> usize {
        self.inner.len_of(page)
    }

    #[cfg(test)]
    pub(crate) fn is_member(&self, page: &PageId, conn: &ConnectionId) -> bool {
        self.inner.contains(page, conn)
    }

    #[cfg(test)]
    pub(crate) fn members(&self, page: &PageId) -> Vec<ConnectionId> {
        self.inner.members(page)
    }

    /// Pages with at least one member.
    pub fn pages(&self) -> usize {
        self.inner.pages()
    }

    /// Sum of all page counts.
    pub fn total_members(&self) -> usize {
        self.inner.total()
    }
}

/// Page -> connections that receive its count updates (joiners and monitors).
#[derive(Debug, Default)]
pub struct SubscriptionTable {
    inner: PageSets,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subscriber(&mut self, page: &PageId, conn: &ConnectionId) -> bool {
        self.inner.insert(page, conn)
    }

    pub fn remove_subscriber(&mut self, page: &PageId, conn: &ConnectionId) -> bool {
        self.inner.remove(page, conn)
    }

    pub fn subscribers(&self, page: &PageId) -> Vec<ConnectionId> {
        self.inner.members(page)
    }

    pub fn is_subscribed(&self, page: &PageId, conn: &ConnectionId) -> bool {
        self.inner.contains(page, conn)
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self, page: &PageId) -> usize {
        self.inner.len_of(page)
    }

    /// Pages with at least one subscriber.
    pub fn pages(&self) -> usize {
        self.inner.pages()
    }

    pub fn total_subscriptions(&self) -> usize {
        self.inner.total()
    }
}
