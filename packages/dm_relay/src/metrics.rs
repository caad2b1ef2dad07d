//! Server metrics for observability
//!
//! Runtime counters for the relay, exposed at `/metrics` and summarized by `/health`.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::relay::RouteOutcome;

/// Server-wide metrics
#[derive(Debug, Default)]
pub struct ServerMetrics {
    // Connection metrics
    /// Currently open WebSocket connections
    pub active_connections: AtomicU64,
    /// Total connections since server start
    pub total_connections: AtomicU64,

    // Presence metrics
    /// Presence snapshots pushed after a registry change
    pub presence_broadcasts: AtomicU64,

    // Relay metrics
    /// `sent-message` events accepted for routing
    pub messages_routed: AtomicU64,
    /// Delivered to the recipient's live session
    pub messages_delivered: AtomicU64,
    /// Recipient not online
    pub messages_offline: AtomicU64,
    /// Recipient online but its outbox was full or closed
    pub messages_undeliverable: AtomicU64,

    // Error metrics
    /// Client events rejected (malformed or invalid for the session state)
    pub events_rejected: AtomicU64,

    /// Server start time (for uptime calculation)
    start_time: Option<Instant>,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn presence_broadcast(&self) {
        self.presence_broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn event_rejected(&self) {
        self.events_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_routed(&self, outcome: &RouteOutcome) {
        self.messages_routed.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            RouteOutcome::Delivered { .. } => &self.messages_delivered,
            RouteOutcome::Offline => &self.messages_offline,
            RouteOutcome::Undeliverable { .. } => &self.messages_undeliverable,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.uptime_secs(),
            connections: ConnectionMetrics {
                active: self.active_connections.load(Ordering::Relaxed),
                total: self.total_connections.load(Ordering::Relaxed),
            },
            presence_broadcasts: self.presence_broadcasts.load(Ordering::Relaxed),
            messages: MessageMetrics {
                routed: self.messages_routed.load(Ordering::Relaxed),
                delivered: self.messages_delivered.load(Ordering::Relaxed),
                offline: self.messages_offline.load(Ordering::Relaxed),
                undeliverable: self.messages_undeliverable.load(Ordering::Relaxed),
            },
            events_rejected: self.events_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Serializable snapshot of all metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub connections: ConnectionMetrics,
    pub presence_broadcasts: u64,
    pub messages: MessageMetrics,
    pub events_rejected: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionMetrics {
    pub active: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetrics {
    pub routed: u64,
    pub delivered: u64,
    pub offline: u64,
    pub undeliverable: u64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub online_users: u64,
    pub connections: u64,
    pub uptime_secs: u64,
}
