//! Relay Hub
//!
//! The single owner of presence state. Every registry mutation and the
//! presence broadcast that follows it happen under one lock guard, so
//! broadcasts are observed in mutation order and never carry a stale
//! snapshot. Nothing awaits while the guard is held.

use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, mpsc};
use tracing::{debug, info};

use crate::config::WebSocketConfig;
use crate::metrics::ServerMetrics;

use super::presence::{PresenceBroadcaster, PresenceSnapshot};
use super::protocol::{DirectMessage, OnlineUser, ServerEvent};
use super::registry::ConnectionRegistry;
use super::router::{MessageRouter, RouteOutcome, SessionOutboxes};

#[derive(Default)]
struct HubState {
    registry: ConnectionRegistry,
    outboxes: SessionOutboxes,
}

/// Channels handed to a freshly connected session.
pub struct SessionChannels {
    pub session_id: String,
    /// Sender side of this session's own outbox (for replies to the session itself).
    pub outbox_tx: mpsc::Sender<ServerEvent>,
    /// Point-to-point events: relayed messages and replies.
    pub outbox_rx: mpsc::Receiver<ServerEvent>,
    /// Presence snapshots shared by all sessions.
    pub presence_rx: broadcast::Receiver<PresenceSnapshot>,
}

pub struct RelayHub {
    state: Mutex<HubState>,
    presence: PresenceBroadcaster,
    send_channel_capacity: usize,
    metrics: Arc<ServerMetrics>,
}

impl RelayHub {
    pub fn new(config: &WebSocketConfig, metrics: Arc<ServerMetrics>) -> Self {
        Self {
            state: Mutex::new(HubState::default()),
            presence: PresenceBroadcaster::new(config.presence_channel_capacity),
            send_channel_capacity: config.send_channel_capacity.max(1),
            metrics,
        }
    }

    /// Attach a new transport session. It starts anonymous: it receives
    /// presence broadcasts but is not routable until it announces a user id.
    pub async fn connect(&self) -> SessionChannels {
        let session_id = uuid::Uuid::new_v4().to_string();
        let (outbox_tx, outbox_rx) = mpsc::channel(self.send_channel_capacity);

        let mut state = self.state.lock().await;
        state.outboxes.insert(&session_id, outbox_tx.clone());
        // Subscribe under the guard so no broadcast slips between attach and subscribe
        let presence_rx = self.presence.subscribe();
        drop(state);

        debug!(session = %session_id, "Session attached");
        SessionChannels {
            session_id,
            outbox_tx,
            outbox_rx,
            presence_rx,
        }
    }

    /// Put `user_id` online on `session_id` and broadcast the new online set.
    /// Returns the session the user was displaced from, if any.
    pub async fn announce(&self, session_id: &str, user_id: &str) -> Option<String> {
        let mut state = self.state.lock().await;
        let displaced = state.registry.register(user_id, session_id);
        self.broadcast_locked(&state);
        drop(state);

        match &displaced {
            Some(old) => info!(user = %user_id, session = %session_id, displaced = %old, "User moved to a new session"),
            None => info!(user = %user_id, session = %session_id, "User online"),
        }
        displaced
    }

    /// Take `user_id` offline on behalf of `session_id`.
    ///
    /// Only the session currently holding the user's entry can remove it. A
    /// session displaced by a newer announce leaves the registry untouched and
    /// nothing is broadcast. Returns whether the user went offline.
    pub async fn logout(&self, session_id: &str, user_id: &str) -> bool {
        let mut state = self.state.lock().await;
        if state.registry.find(user_id) != Some(session_id) {
            drop(state);
            debug!(user = %user_id, session = %session_id, "Logout from a session not holding the user");
            return false;
        }
        state.registry.unregister_by_user(user_id);
        self.broadcast_locked(&state);
        drop(state);

        info!(user = %user_id, session = %session_id, "User logged out");
        true
    }

    /// Transport for `session_id` is gone: drop its outbox and take offline
    /// whichever user was announced on it. Broadcasts only if a user went offline.
    pub async fn disconnect(&self, session_id: &str) -> Option<String> {
        let mut state = self.state.lock().await;
        state.outboxes.remove(session_id);
        let removed = state.registry.unregister_by_session(session_id);
        if removed.is_some() {
            self.broadcast_locked(&state);
        }
        drop(state);

        match &removed {
            Some(user_id) => info!(user = %user_id, session = %session_id, "User offline"),
            None => debug!(session = %session_id, "Anonymous session detached"),
        }
        removed
    }

    /// Forward `message` to the recipient's live session, if any.
    pub async fn route(&self, message: DirectMessage) -> RouteOutcome {
        let (from, to) = (message.from.clone(), message.to.clone());
        let outcome = {
            let state = self.state.lock().await;
            MessageRouter::route(&state.registry, &state.outboxes, message)
        };
        self.metrics.message_routed(&outcome);
        debug!(from = %from, to = %to, outcome = ?outcome, "Message routed");
        outcome
    }

    /// Re-send the current online set to everyone without changing it.
    pub async fn broadcast_presence(&self) -> PresenceSnapshot {
        let state = self.state.lock().await;
        self.broadcast_locked(&state)
    }

    pub async fn find(&self, user_id: &str) -> Option<String> {
        let state = self.state.lock().await;
        state.registry.find(user_id).map(str::to_string)
    }

    pub async fn snapshot(&self) -> Vec<OnlineUser> {
        self.state.lock().await.registry.snapshot()
    }

    pub async fn connected_sessions(&self) -> usize {
        self.state.lock().await.outboxes.len()
    }

    fn broadcast_locked(&self, state: &HubState) -> PresenceSnapshot {
        let snapshot = state.registry.snapshot();
        self.presence.broadcast(snapshot.clone());
        self.metrics.presence_broadcast();
        snapshot
    }
}
