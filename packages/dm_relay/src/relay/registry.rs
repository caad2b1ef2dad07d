//! Connection Registry
//!
//! Which announced user is reachable on which live session. Plain data with no
//! synchronization of its own; `RelayHub` owns the only instance behind a lock.

use super::protocol::OnlineUser;

/// Ordered set of online users.
///
/// Invariants: at most one entry per session id and at most one entry per
/// user id. Entries keep registration order, which is the order snapshots
/// are broadcast in.
#[derive(Debug, Default, Clone)]
pub struct ConnectionRegistry {
    entries: Vec<OnlineUser>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `user_id` online on `session_id`.
    ///
    /// Replaces any entry held by the same user (latest session wins) and any
    /// entry previously announced on the same session. Returns the session the
    /// user was displaced from, if it was a different one.
    pub fn register(&mut self, user_id: &str, session_id: &str) -> Option<String> {
        let displaced = self
            .entries
            .iter()
            .find(|e| e.user_id == user_id && e.session_id != session_id)
            .map(|e| e.session_id.clone());

        self.entries
            .retain(|e| e.user_id != user_id && e.session_id != session_id);
        self.entries.push(OnlineUser {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
        });
        displaced
    }

    /// Remove whatever user is registered on `session_id`. Returns the removed user id.
    pub fn unregister_by_session(&mut self, session_id: &str) -> Option<String> {
        let idx = self.entries.iter().position(|e| e.session_id == session_id)?;
        Some(self.entries.remove(idx).user_id)
    }

    /// Remove `user_id` from the online set. Returns the session it was on.
    pub fn unregister_by_user(&mut self, user_id: &str) -> Option<String> {
        let idx = self.entries.iter().position(|e| e.user_id == user_id)?;
        Some(self.entries.remove(idx).session_id)
    }

    pub fn find(&self, user_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.user_id == user_id)
            .map(|e| e.session_id.as_str())
    }

    /// Owned copy of the current online set, safe to fan out after the lock is gone.
    pub fn snapshot(&self) -> Vec<OnlineUser> {
        self.entries.clone()
    }
}
