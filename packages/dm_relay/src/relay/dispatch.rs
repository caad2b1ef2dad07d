//! Client event dispatch, transport-agnostic.
//!
//! The WebSocket handler parses frames into `ClientEvent`s and hands them here
//! together with the session's context. Everything the relay does in response
//! to a client lives in this file.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::metrics::ServerMetrics;

use super::hub::RelayHub;
use super::lifecycle::SessionState;
use super::protocol::{ClientEvent, DirectMessage, ServerEvent};

/// Whether the connection should stay open after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Per-connection context shared by all dispatch calls.
pub struct SessionContext {
    pub session_id: String,
    pub state: SessionState,
    pub hub: Arc<RelayHub>,
    pub metrics: Arc<ServerMetrics>,
    /// This session's own outbox, for replies.
    pub reply_tx: mpsc::Sender<ServerEvent>,
}

impl SessionContext {
    fn reject(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(session = %self.session_id, "Rejected client event: {}", message);
        self.metrics.event_rejected();
        if self.reply_tx.try_send(ServerEvent::Error { message }).is_err() {
            warn!(session = %self.session_id, "Failed to send error reply - outbox full or closed");
        }
    }

    /// Report a frame that did not parse as a client event.
    pub fn reject_malformed(&self, err: &serde_json::Error) {
        self.reject(format!("invalid event: {err}"));
    }

    /// Transport is gone. Idempotent.
    pub async fn close(&mut self) {
        self.state.disconnect();
        self.hub.disconnect(&self.session_id).await;
    }
}

pub async fn dispatch_event(ctx: &mut SessionContext, event: ClientEvent) -> Flow {
    if ctx.state.is_closed() {
        return Flow::Close;
    }

    match event {
        ClientEvent::AddUser(user_id) => {
            let user_id = user_id.trim().to_string();
            match ctx.state.announce(&user_id) {
                Ok(previous) => {
                    if let Some(prev) = previous.filter(|p| *p != user_id) {
                        debug!(session = %ctx.session_id, previous = %prev, "Session changed identity");
                    }
                    ctx.hub.announce(&ctx.session_id, &user_id).await;
                }
                Err(e) => ctx.reject(e.to_string()),
            }
            Flow::Continue
        }

        ClientEvent::SentMessage(message) => {
            let sender = match ctx.state.sender() {
                Ok(s) => s.to_string(),
                Err(e) => {
                    ctx.reject(e.to_string());
                    return Flow::Continue;
                }
            };
            match prepare_outbound(message, &sender) {
                Ok(message) => {
                    ctx.hub.route(message).await;
                }
                Err(reason) => ctx.reject(reason),
            }
            Flow::Continue
        }

        ClientEvent::Logout(user_id) => match ctx.state.logout(user_id.trim()) {
            Ok(user_id) => {
                ctx.hub.logout(&ctx.session_id, &user_id).await;
                Flow::Close
            }
            Err(e) => {
                ctx.reject(e.to_string());
                Flow::Continue
            }
        },
    }
}

/// Normalize a client-supplied message for delivery from `sender`.
///
/// `from` is always the session's announced identity; `fromSelf` is set from
/// the recipient's point of view.
fn prepare_outbound(mut message: DirectMessage, sender: &str) -> Result<DirectMessage, String> {
    message.to = message.to.trim().to_string();
    if message.to.is_empty() {
        return Err("to is required !".to_string());
    }
    message.from = sender.to_string();
    message.from_self = message.from == message.to;
    if message.created_at.as_deref().is_none_or(str::is_empty) {
        message.created_at = Some(chrono::Utc::now().to_rfc3339());
    }
    Ok(message)
}
