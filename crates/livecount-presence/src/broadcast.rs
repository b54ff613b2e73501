//! Broadcast gateway: hands count updates to per-connection outboxes.
//!
//! Each connection task owns the receiving half of a bounded channel and
//! writes whatever arrives to its socket. Delivery here is a non-blocking
//! `try_send`, so a stalled client only ever loses its own updates.

use std::collections::HashMap;
use std::ops::AddAssign;

use livecount_common::{ConnectionId, DeliveryError};
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::engine::{Audience, Dispatch};
use crate::protocol::ServerMessage;

/// Outcome of delivering one or more dispatches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub dropped: usize,
}

impl AddAssign for DeliveryReport {
    fn add_assign(&mut self, other: Self) {
        self.delivered += other.delivered;
        self.dropped += other.dropped;
    }
}

#[derive(Default)]
pub struct BroadcastGateway {
    outboxes: RwLock<HashMap<ConnectionId, mpsc::Sender<String>>>,
}

impl BroadcastGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the outbox for a newly accepted connection.
    pub async fn register(&self, id: ConnectionId, tx: mpsc::Sender<String>) {
        self.outboxes.write().await.insert(id, tx);
    }

    /// Detach a connection's outbox. Returns false if none was registered.
    pub async fn unregister(&self, id: &ConnectionId) -> bool {
        self.outboxes.write().await.remove(id).is_some()
    }

    /// Send an arbitrary message to one connection.
    pub async fn send_to(&self, id: &ConnectionId, msg: &ServerMessage) -> Result<(), DeliveryError> {
        let outboxes = self.outboxes.read().await;
        Self::enqueue(&outboxes, id, msg.to_json())
    }

    /// Deliver one dispatch to its audience. Failures are logged and counted,
    /// never returned.
    pub async fn deliver(&self, dispatch: &Dispatch) -> DeliveryReport {
        let outboxes = self.outboxes.read().await;
        Self::deliver_locked(&outboxes, dispatch)
    }

    /// Deliver several dispatches in order under one read lock.
    pub async fn deliver_all(&self, dispatches: &[Dispatch]) -> DeliveryReport {
        let outboxes = self.outboxes.read().await;
        let mut report = DeliveryReport::default();
        for dispatch in dispatches {
            report += Self::deliver_locked(&outboxes, dispatch);
        }
        report
    }

    /// Number of attached outboxes.
    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.outboxes.read().await.len()
    }

    fn deliver_locked(
        outboxes: &HashMap<ConnectionId, mpsc::Sender<String>>,
        dispatch: &Dispatch,
    ) -> DeliveryReport {
        let json = ServerMessage::from(&dispatch.update).to_json();
        let mut report = DeliveryReport::default();

        let mut push = |id: &ConnectionId| match Self::enqueue(outboxes, id, json.clone()) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                debug!(page = %dispatch.update.page, error = %e, "count update dropped");
                report.dropped += 1;
            }
        };

        match &dispatch.audience {
            Audience::Subscribers(ids) => ids.iter().for_each(&mut push),
            Audience::Single(id) => push(id),
        }
        report
    }

    fn enqueue(
        outboxes: &HashMap<ConnectionId, mpsc::Sender<String>>,
        id: &ConnectionId,
        json: String,
    ) -> Result<(), DeliveryError> {
        let tx = outboxes
            .get(id)
            .ok_or_else(|| DeliveryError::Unknown(id.clone()))?;
        tx.try_send(json).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full(id.clone()),
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed(id.clone()),
        })
    }
}
