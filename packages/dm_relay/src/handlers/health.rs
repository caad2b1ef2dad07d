use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::metrics;

/// Health check endpoint - returns server status
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let online = state.hub.snapshot().await.len() as u64;
    let sessions = state.hub.connected_sessions().await as u64;

    Json(metrics::HealthStatus {
        status: "healthy".to_string(),
        online_users: online,
        connections: sessions,
        uptime_secs: state.metrics.uptime_secs(),
    })
}

/// Metrics endpoint - returns relay counters
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

/// Current presence snapshot, same shape as the `online-users` event
pub async fn online_users_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.hub.snapshot().await)
}

/// Liveness probe - returns 200 if the server is running
pub async fn health_live_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "alive" }))
}

/// Readiness probe - returns 200 if the message store is reachable
pub async fn health_ready_handler(State(state): State<AppState>) -> Response {
    let db_ok = state.repository.pool.acquire().await.is_ok();

    if db_ok {
        Json(serde_json::json!({
            "status": "ready",
            "database": "connected"
        }))
        .into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "not_ready",
                "database": "disconnected"
            })),
        )
            .into_response()
    }
}
