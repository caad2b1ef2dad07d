//! Message Router
//!
//! Point-to-point live delivery. Persistence is not the router's concern: the
//! sender writes history through the REST API whether or not the recipient
//! is online.

use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;

use super::protocol::{DirectMessage, ServerEvent};
use super::registry::ConnectionRegistry;

/// What happened to one routed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Queued on the recipient's session outbox.
    Delivered { session_id: String },
    /// Recipient has no announced session; history is the only copy.
    Offline,
    /// Recipient is registered but its outbox is full or closed. Dropped.
    Undeliverable { session_id: String },
}

/// Outbound queues of every connected session, announced or not.
#[derive(Debug, Default)]
pub struct SessionOutboxes {
    senders: HashMap<String, mpsc::Sender<ServerEvent>>,
}

impl SessionOutboxes {
    pub fn insert(&mut self, session_id: &str, tx: mpsc::Sender<ServerEvent>) {
        self.senders.insert(session_id.to_string(), tx);
    }

    pub fn remove(&mut self, session_id: &str) -> bool {
        self.senders.remove(session_id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.senders.len()
    }

    /// Queue `event` for one session without waiting. False if the session is
    /// unknown, gone, or backed up.
    pub fn try_send(&self, session_id: &str, event: ServerEvent) -> bool {
        match self.senders.get(session_id) {
            Some(tx) => tx.try_send(event).is_ok(),
            None => false,
        }
    }
}

pub struct MessageRouter;

impl MessageRouter {
    /// Deliver `message` to the live session of `message.to`, if there is one.
    ///
    /// Never blocks and never fails: transport problems are folded into
    /// `RouteOutcome::Undeliverable`.
    pub fn route(
        registry: &ConnectionRegistry,
        outboxes: &SessionOutboxes,
        message: DirectMessage,
    ) -> RouteOutcome {
        let Some(session_id) = registry.find(&message.to) else {
            debug!(to = %message.to, "Recipient offline, no live delivery");
            return RouteOutcome::Offline;
        };
        let session_id = session_id.to_string();

        if outboxes.try_send(&session_id, ServerEvent::ReceiveMessage(message)) {
            RouteOutcome::Delivered { session_id }
        } else {
            debug!(session = %session_id, "Live delivery dropped");
            RouteOutcome::Undeliverable { session_id }
        }
    }
}
