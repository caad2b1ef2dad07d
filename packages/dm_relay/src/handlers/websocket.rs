use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};

use crate::AppState;
use crate::relay;

/// Relay WebSocket: presence announcements and live direct messages.
pub async fn relay_websocket_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let hub = state.hub.clone();
    let metrics = state.metrics.clone();
    ws.on_upgrade(move |socket| relay::handle_relay_ws(socket, hub, metrics))
}
