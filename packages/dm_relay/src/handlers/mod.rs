pub mod accounts;
pub mod health;
pub mod messages;
pub mod websocket;

// Re-export all handlers for easy route registration
pub use accounts::{list_contacts_handler, login_handler, register_handler};
pub use health::{
    health_handler, health_live_handler, health_ready_handler, metrics_handler,
    online_users_handler,
};
pub use messages::{add_message_handler, get_messages_handler};
pub use websocket::relay_websocket_handler;
