//! Shared handle that serializes presence events and delivers the results.

use std::sync::Arc;

use livecount_common::{ConnectionId, DeliveryError, PageId};
use tokio::sync::{mpsc, Mutex};

use crate::broadcast::{BroadcastGateway, DeliveryReport};
use crate::engine::{PresenceEngine, PresenceStats};
use crate::protocol::ServerMessage;

/// Thread-safe presence hub. Clone it into every connection task.
///
/// All presence events go through one engine lock, so they are applied in a
/// single total order. Updates are enqueued before that lock is released,
/// which keeps each outbox in the same order as the state changes.
#[derive(Clone)]
pub struct PresenceHub {
    engine: Arc<Mutex<PresenceEngine>>,
    gateway: Arc<BroadcastGateway>,
}

impl PresenceHub {
    pub fn new() -> Self {
        Self {
            engine: Arc::new(Mutex::new(PresenceEngine::new())),
            gateway: Arc::new(BroadcastGateway::new()),
        }
    }

    /// Register a new connection whose updates go to `tx`.
    pub async fn connect(&self, tx: mpsc::Sender<String>) -> ConnectionId {
        let id = ConnectionId::new();
        self.gateway.register(id.clone(), tx).await;
        self.engine.lock().await.connect(&id);
        id
    }

    pub async fn join(&self, id: &ConnectionId, page: PageId) -> DeliveryReport {
        let mut engine = self.engine.lock().await;
        let dispatches = engine.join(id, page);
        self.gateway.deliver_all(&dispatches).await
    }

    pub async fn monitor(&self, id: &ConnectionId, page: PageId) -> DeliveryReport {
        let mut engine = self.engine.lock().await;
        match engine.monitor(id, page) {
            Some(dispatch) => self.gateway.deliver(&dispatch).await,
            None => DeliveryReport::default(),
        }
    }

    pub async fn leave(&self, id: &ConnectionId) -> DeliveryReport {
        let mut engine = self.engine.lock().await;
        match engine.leave(id) {
            Some(dispatch) => self.gateway.deliver(&dispatch).await,
            None => DeliveryReport::default(),
        }
    }

    /// Remove every trace of `id`. Safe to call more than once.
    pub async fn disconnect(&self, id: &ConnectionId) -> DeliveryReport {
        let report = {
            let mut engine = self.engine.lock().await;
            match engine.disconnect(id) {
                Some(dispatch) => self.gateway.deliver(&dispatch).await,
                None => DeliveryReport::default(),
            }
        };
        self.gateway.unregister(id).await;
        report
    }

    /// Reply to one connection outside of any presence event.
    pub async fn send_to(&self, id: &ConnectionId, msg: &ServerMessage) -> Result<(), DeliveryError> {
        self.gateway.send_to(id, msg).await
    }

    pub async fn count(&self, page: &PageId) -> usize {
        self.engine.lock().await.count(page)
    }

    pub async fn stats(&self) -> PresenceStats {
        self.engine.lock().await.stats()
    }
}

impl Default for PresenceHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUF: usize = 16;

    async fn client(hub: &PresenceHub) -> (ConnectionId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(BUF);
        (hub.connect(tx).await, rx)
    }

    fn next(rx: &mut mpsc::Receiver<String>) -> Option<ServerMessage> {
        rx.try_recv()
            .ok()
            .map(|text| serde_json::from_str(&text).unwrap())
    }

    fn update(page: &str, count: usize) -> Option<ServerMessage> {
        Some(ServerMessage::UpdateCount {
            page_path: PageId::from(page),
            count,
        })
    }

    #[tokio::test]
    async fn scenario_a_disconnect_notifies_remaining_joiner() {
        let hub = PresenceHub::new();
        let (c1, mut rx1) = client(&hub).await;
        let (c2, mut rx2) = client(&hub).await;

        hub.join(&c1, PageId::from("/home")).await;
        hub.join(&c2, PageId::from("/home")).await;
        assert_eq!(hub.count(&PageId::from("/home")).await, 2);

        assert_eq!(next(&mut rx1), update("/home", 1));
        assert_eq!(next(&mut rx1), update("/home", 2));
        assert_eq!(next(&mut rx2), update("/home", 2));

        let report = hub.disconnect(&c1).await;
        assert_eq!(report, DeliveryReport { delivered: 1, dropped: 0 });
        assert_eq!(hub.count(&PageId::from("/home")).await, 1);
        assert_eq!(next(&mut rx2), update("/home", 1));
        assert_eq!(next(&mut rx1), None);
    }

    #[tokio::test]
    async fn scenario_b_monitor_is_unicast() {
        let hub = PresenceHub::new();
        let (c1, mut rx1) = client(&hub).await;
        let (c2, mut rx2) = client(&hub).await;
        let (d, mut rx_d) = client(&hub).await;
        hub.join(&c1, PageId::from("/home")).await;
        hub.join(&c2, PageId::from("/home")).await;
        while next(&mut rx1).is_some() {}
        while next(&mut rx2).is_some() {}

        hub.monitor(&d, PageId::from("/home")).await;
        assert_eq!(next(&mut rx_d), update("/home", 2));
        assert_eq!(next(&mut rx1), None);
        assert_eq!(next(&mut rx2), None);

        // The monitor now sees later changes too.
        let (c3, _rx3) = client(&hub).await;
        hub.join(&c3, PageId::from("/home")).await;
        assert_eq!(next(&mut rx_d), update("/home", 3));
    }

    #[tokio::test]
    async fn scenario_c_move_updates_both_pages() {
        let hub = PresenceHub::new();
        let (stay, mut rx_stay) = client(&hub).await;
        let (mover, mut rx_mover) = client(&hub).await;
        hub.join(&stay, PageId::from("/a")).await;
        hub.join(&mover, PageId::from("/a")).await;
        while next(&mut rx_stay).is_some() {}
        while next(&mut rx_mover).is_some() {}

        let report = hub.join(&mover, PageId::from("/b")).await;
        assert_eq!(report.delivered, 2);
        assert_eq!(next(&mut rx_stay), update("/a", 1));
        assert_eq!(next(&mut rx_mover), update("/b", 1));
        assert_eq!(next(&mut rx_mover), None);
    }

    #[tokio::test]
    async fn scenario_d_duplicate_disconnect_is_harmless() {
        let hub = PresenceHub::new();
        let (c, _rx) = client(&hub).await;
        let (other, mut rx_other) = client(&hub).await;
        hub.join(&c, PageId::from("/x")).await;
        hub.join(&other, PageId::from("/x")).await;
        while next(&mut rx_other).is_some() {}

        hub.disconnect(&c).await;
        let second = hub.disconnect(&c).await;
        assert_eq!(second, DeliveryReport::default());
        assert_eq!(hub.count(&PageId::from("/x")).await, 1);
        assert_eq!(next(&mut rx_other), update("/x", 1));
        assert_eq!(next(&mut rx_other), None);
    }

    #[tokio::test]
    async fn slow_client_does_not_stall_others() {
        let hub = PresenceHub::new();
        let (tx_slow, _rx_slow) = mpsc::channel(1);
        let slow = hub.connect(tx_slow).await;
        let (fast, mut rx_fast) = client(&hub).await;

        hub.join(&slow, PageId::from("/p")).await;
        hub.join(&fast, PageId::from("/p")).await;
        let report = hub.leave(&fast).await;

        assert_eq!(report.dropped, 1);
        assert_eq!(next(&mut rx_fast), update("/p", 2));
        assert_eq!(hub.count(&PageId::from("/p")).await, 1);
    }

    #[tokio::test]
    async fn disconnect_clears_stats() {
        let hub = PresenceHub::new();
        let (c, _rx) = client(&hub).await;
        hub.join(&c, PageId::from("/a")).await;
        hub.monitor(&c, PageId::from("/b")).await;
        assert_eq!(hub.stats().await.subscriptions, 2);

        hub.disconnect(&c).await;
        assert_eq!(hub.stats().await, PresenceStats::default());
        assert!(hub.send_to(&c, &ServerMessage::Pong).await.is_err());
    }

    #[tokio::test]
    async fn concurrent_joins_are_all_counted() {
        let hub = PresenceHub::new();
        let mut handles = Vec::new();
        for _ in 0..32 {
            let hub = hub.clone();
            handles.push(tokio::spawn(async move {
                let (tx, rx) = mpsc::channel(64);
                let id = hub.connect(tx).await;
                hub.join(&id, PageId::from("/busy")).await;
                (id, rx)
            }));
        }
        let mut clients = Vec::new();
        for handle in handles {
            clients.push(handle.await.unwrap());
        }
        assert_eq!(hub.count(&PageId::from("/busy")).await, 32);

        for (id, _rx) in clients.iter().take(10) {
            hub.disconnect(id).await;
        }
        assert_eq!(hub.count(&PageId::from("/busy")).await, 22);
    }
}
