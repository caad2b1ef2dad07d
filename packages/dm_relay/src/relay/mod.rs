//! Presence tracking and live message relay
//!
//! One WebSocket per client that:
//! - Announces which user it belongs to (`add-user`) and leaves (`logout`)
//! - Receives the full online set after every presence change (`online-users`)
//! - Sends direct messages that are forwarded to the recipient's live session
//!   only (`sent-message` → `receive-message`)

mod dispatch;
mod handler;
mod hub;
mod lifecycle;
mod presence;
mod protocol;
mod registry;
mod router;


pub use dispatch::{Flow, SessionContext, dispatch_event};
pub use handler::handle_relay_ws;
pub use hub::{RelayHub, SessionChannels};
pub use lifecycle::{LifecycleError, SessionState};
pub use presence::{PresenceBroadcaster, PresenceSnapshot};
pub use protocol::{ClientEvent, DirectMessage, OnlineUser, ServerEvent};
pub use registry::ConnectionRegistry;
pub use router::{MessageRouter, RouteOutcome, SessionOutboxes};
