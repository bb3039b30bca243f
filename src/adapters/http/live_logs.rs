//! Live log WebSocket endpoint.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::server::AppState;
use crate::services::LiveLogRegistry;

/// Upgrade to a WebSocket registered under `client_id`.
pub async fn live_logs(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Response {
    let registry = Arc::clone(&state.live_logs);
    ws.on_upgrade(move |socket| handle_socket(socket, registry, client_id))
}

async fn handle_socket(socket: WebSocket, registry: Arc<LiveLogRegistry>, client_id: String) {
    let mut subscription = registry.connect(&client_id).await;
    let connection_id = subscription.connection_id;
    info!(%client_id, connection_id, "Live log socket opened");

    registry.send(&client_id, "info", "connected").await;

    let (mut sink, mut stream) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = subscription.events.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to encode log event");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Inbound messages are ignored; the loop only watches for close.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    registry.disconnect(&client_id, connection_id).await;
    debug!(%client_id, connection_id, "Live log socket closed");
}
