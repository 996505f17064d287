//! `WebSocket` handler for live queue updates.
//!
//! Clients connect to `GET /ws/queue` and receive one JSON text frame per
//! committed change, encoded as a [`QueueEvent`](queueline_types::QueueEvent).
//! Each connection subscribes to the shared [`Notifier`](crate::notifier::Notifier)
//! and deregisters when the socket closes.
//!
//! A client that falls behind skips ahead to the newest events; it can
//! resynchronize by re-fetching `GET /api/queues`.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` observer connection.
///
/// # Route
///
/// `GET /ws/queue`
pub async fn ws_queue(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| observe(socket, state))
}

async fn observe(mut socket: WebSocket, state: Arc<AppState>) {
    let mut rx = state.notifier.subscribe();
    debug!(
        observers = state.notifier.observer_count(),
        "Queue observer connected"
    );

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        let json = match serde_json::to_string(&event) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!("Failed to serialize queue event: {e}");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            debug!("Queue observer gone (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "Queue observer lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Notifier closed, ending observer session");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Queue observer disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("Queue observer gone (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("Queue observer socket error: {e}");
                        return;
                    }
                    // Observers are receive-only.
                    _ => {}
                }
            }
        }
    }
}
