//! Accept loop and WebSocket handshake.

use std::net::SocketAddr;
use std::sync::Arc;

use livecount_config::{LivecountConfig, ServerConfig};
use livecount_presence::PresenceHub;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

use crate::connection::handle_connection;

/// Accept connections forever, one task per socket.
pub async fn serve(listener: TcpListener, hub: PresenceHub, config: Arc<LivecountConfig>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let hub = hub.clone();
                let config = Arc::clone(&config);
                tokio::spawn(async move {
                    if let Some(ws) = handshake(stream, addr, &config.server).await {
                        handle_connection(ws, addr, hub, &config.transport).await;
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}

/// Upgrade to WebSocket, refusing origins outside `server.allowed_origins`.
async fn handshake(
    stream: TcpStream,
    addr: SocketAddr,
    server: &ServerConfig,
) -> Option<WebSocketStream<TcpStream>> {
    let check_origin = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        let origin = req
            .headers()
            .get("origin")
            .and_then(|value| value.to_str().ok());
        if server.origin_allowed(origin) {
            return Ok(resp);
        }
        tracing::warn!(peer = %addr, origin = ?origin, "Origin rejected");
        let mut denied = ErrorResponse::new(Some("origin not allowed".into()));
        *denied.status_mut() = StatusCode::FORBIDDEN;
        Err(denied)
    };

    match accept_hdr_async(stream, check_origin).await {
        Ok(ws) => Some(ws),
        Err(e) => {
            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
            None
        }
    }
}
