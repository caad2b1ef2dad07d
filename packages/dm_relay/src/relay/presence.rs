//! Presence Broadcaster
//!
//! Fans the full online set out to every connected session. Receivers that
//! fall behind lose only stale snapshots: the next one they read is current.

use tokio::sync::broadcast;
use tracing::debug;

use super::protocol::OnlineUser;

pub type PresenceSnapshot = Vec<OnlineUser>;

pub struct PresenceBroadcaster {
    tx: broadcast::Sender<PresenceSnapshot>,
}

impl PresenceBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe a session to future snapshots.
    pub fn subscribe(&self) -> broadcast::Receiver<PresenceSnapshot> {
        self.tx.subscribe()
    }

    /// Push `snapshot` to all subscribers without waiting on any of them.
    /// Returns the number of sessions it was queued for.
    pub fn broadcast(&self, snapshot: PresenceSnapshot) -> usize {
        let online = snapshot.len();
        match self.tx.send(snapshot) {
            Ok(receivers) => {
                debug!(online, receivers, "Presence broadcast");
                receivers
            }
            Err(_) => {
                debug!(online, "Presence broadcast with no connected sessions");
                0
            }
        }
    }
}
