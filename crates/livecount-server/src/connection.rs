//! Per-connection handler: register, translate frames into presence events,
//! forward queued updates, clean up on close.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use livecount_common::{ConnectionId, ProtocolError};
use livecount_config::TransportConfig;
use livecount_presence::protocol::{self, ClientMessage, ServerMessage};
use livecount_presence::PresenceHub;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

/// Handle a single WebSocket connection until it closes.
pub async fn handle_connection(
    ws: WebSocketStream<TcpStream>,
    addr: SocketAddr,
    hub: PresenceHub,
    transport: &TransportConfig,
) {
    let (mut sink, mut stream) = ws.split();

    // 1. Create our outbox and register with the hub.
    let (tx, mut rx) = mpsc::channel::<String>(transport.outbound_buffer as usize);
    let id = hub.connect(tx).await;
    tracing::info!(peer = %addr, connection = %id, "Client connected");

    let max_frame = transport.max_frame_bytes as usize;
    let idle_timeout = Duration::from_secs(transport.idle_timeout);
    let mut heartbeat = tokio::time::interval(Duration::from_secs(transport.heartbeat_interval));
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    heartbeat.tick().await;
    let mut last_inbound = Instant::now();

    // 2. Forwarding loop.
    let reason = loop {
        tokio::select! {
            // Queued updates and replies → this client's WebSocket
            Some(msg) = rx.recv() => {
                if sink.send(Message::Text(msg.into())).await.is_err() {
                    break "write failed";
                }
            }

            // Frames from this client → presence events
            frame = stream.next() => {
                last_inbound = Instant::now();
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        handle_text(&hub, &id, text.as_str(), max_frame).await;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        reject(&hub, &id, ProtocolError::UnsupportedFrame("binary")).await;
                    }
                    // Pings are answered by tungstenite itself.
                    Some(Ok(Message::Close(_))) | None => break "closed",
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break "error";
                    }
                    _ => {}
                }
            }

            _ = heartbeat.tick() => {
                if last_inbound.elapsed() >= idle_timeout {
                    break "idle timeout";
                }
                if sink.send(Message::Ping(Default::default())).await.is_err() {
                    break "write failed";
                }
            }
        }
    };

    // 3. Cleanup.
    let report = hub.disconnect(&id).await;
    tracing::info!(
        peer = %addr,
        connection = %id,
        reason,
        notified = report.delivered,
        "Client disconnected"
    );
}

/// Decode one text frame and apply it.
async fn handle_text(hub: &PresenceHub, id: &ConnectionId, text: &str, max_frame: usize) {
    match protocol::decode(text, max_frame) {
        Ok(msg) => apply(hub, id, msg).await,
        Err(e) => reject(hub, id, e).await,
    }
}

async fn apply(hub: &PresenceHub, id: &ConnectionId, msg: ClientMessage) {
    match msg {
        ClientMessage::JoinPage { page_path } => {
            hub.join(id, page_path).await;
        }
        ClientMessage::MonitorPage { page_path } => {
            hub.monitor(id, page_path).await;
        }
        ClientMessage::LeavePage => {
            hub.leave(id).await;
        }
        ClientMessage::Ping => {
            if let Err(e) = hub.send_to(id, &ServerMessage::Pong).await {
                tracing::debug!(connection = %id, error = %e, "Pong dropped");
            }
        }
    }
}

/// Tell the client its frame was ignored. The connection stays open.
async fn reject(hub: &PresenceHub, id: &ConnectionId, err: ProtocolError) {
    tracing::warn!(connection = %id, error = %err, "Invalid client message");
    let reply = ServerMessage::Error {
        message: err.to_string(),
    };
    if let Err(e) = hub.send_to(id, &reply).await {
        tracing::debug!(connection = %id, error = %e, "Error reply dropped");
    }
}
