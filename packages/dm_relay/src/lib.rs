//! Direct-message relay server.
//!
//! Tracks which users are online, pushes the online set to every connected
//! session, forwards direct messages between live sessions, and keeps a
//! durable per-pair chat history behind a small REST surface.

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::warn;
use uuid::Uuid;

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod relay;
pub mod repository;

#[cfg(test)]
mod test_helpers;

use crate::config::ServerConfig;
use crate::metrics::ServerMetrics;
use crate::relay::RelayHub;
use crate::repository::ChatRepository;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub server_config: Arc<ServerConfig>,
    pub repository: Arc<ChatRepository>,
    pub hub: Arc<RelayHub>,
    pub metrics: Arc<ServerMetrics>,
}

impl AppState {
    pub fn new(server_config: ServerConfig, repository: ChatRepository) -> Self {
        let metrics = Arc::new(ServerMetrics::new());
        let hub = Arc::new(RelayHub::new(&server_config.websocket, metrics.clone()));
        Self {
            server_config: Arc::new(server_config),
            repository: Arc::new(repository),
            hub,
            metrics,
        }
    }
}

/// Custom span maker that adds a unique request ID to each incoming request
#[derive(Clone)]
struct RequestIdMakeSpan;

impl<B> MakeSpan<B> for RequestIdMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> tracing::Span {
        let request_id = Uuid::new_v4().to_string();
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    CorsLayer::permissive().allow_origin(AllowOrigin::list(allowed))
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.server_config.cors_origins);

    Router::new()
        // Accounts
        .route("/register", post(handlers::register_handler))
        .route("/login", post(handlers::login_handler))
        .route("/get-all-user/{id}", post(handlers::list_contacts_handler))
        // History
        .route("/add-message", post(handlers::add_message_handler))
        .route("/get-message", post(handlers::get_messages_handler))
        // Live relay
        .route("/ws", get(handlers::relay_websocket_handler))
        .route("/online-users", get(handlers::online_users_handler))
        // Health and metrics
        .route("/health", get(handlers::health_handler))
        .route("/health/live", get(handlers::health_live_handler))
        .route("/health/ready", get(handlers::health_ready_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(TraceLayer::new_for_http().make_span_with(RequestIdMakeSpan))
        .layer(cors)
        .with_state(state)
}
