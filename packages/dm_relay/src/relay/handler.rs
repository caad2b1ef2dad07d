//! WebSocket Handler
//!
//! One task set per connection: a writer draining the session outbox and the
//! shared presence feed, and a reader dispatching client events. Whichever
//! finishes first tears the session down.

use axum::extract::ws::{Message, WebSocket};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::metrics::ServerMetrics;

use super::dispatch::{Flow, SessionContext, dispatch_event};
use super::hub::{RelayHub, SessionChannels};
use super::lifecycle::SessionState;
use super::protocol::{ClientEvent, ServerEvent};

/// Handle one relay WebSocket connection until either side closes it.
pub async fn handle_relay_ws(socket: WebSocket, hub: Arc<RelayHub>, metrics: Arc<ServerMetrics>) {
    metrics.connection_opened();

    let SessionChannels {
        session_id,
        outbox_tx,
        mut outbox_rx,
        mut presence_rx,
    } = hub.connect().await;
    info!(session = %session_id, "New relay WebSocket connection");

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Task to send messages to WebSocket
    let writer_session = session_id.clone();
    let sender_task = async move {
        loop {
            let event = tokio::select! {
                Some(event) = outbox_rx.recv() => event,
                snapshot = presence_rx.recv() => match snapshot {
                    Ok(users) => ServerEvent::OnlineUsers(users),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Full-state snapshots: skipping stale ones loses nothing
                        debug!(session = %writer_session, skipped = n, "Presence feed lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                else => break,
            };
            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    };

    // Task to handle incoming messages
    let mut ctx = SessionContext {
        session_id: session_id.clone(),
        state: SessionState::default(),
        hub: hub.clone(),
        metrics: metrics.clone(),
        reply_tx: outbox_tx,
    };
    let input_task = async {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => {
                        if dispatch_event(&mut ctx, event).await == Flow::Close {
                            break;
                        }
                    }
                    Err(e) => ctx.reject_malformed(&e),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!(session = %session_id, "WebSocket receive error: {}", e);
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = sender_task => {
            debug!(session = %session_id, "Writer finished");
        }
        _ = input_task => {
            debug!(session = %session_id, "Reader finished");
        }
    }

    ctx.close().await;
    metrics.connection_closed();
    info!(session = %session_id, "Relay WebSocket connection closed");
}
