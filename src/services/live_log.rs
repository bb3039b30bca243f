//! Live log channel registry.
//!
//! Tracks at most one open log connection per client id and pushes
//! server-originated log events to it. The registry is an injected service;
//! the HTTP layer owns the socket and drains the receiver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// One message on a client's live log channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
}

impl LogEvent {
    pub fn new(level: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level: level.into(),
            message: message.into(),
        }
    }
}

/// Handle returned by [`LiveLogRegistry::connect`].
#[derive(Debug)]
pub struct LogSubscription {
    pub connection_id: u64,
    pub events: mpsc::UnboundedReceiver<LogEvent>,
}

struct Connection {
    id: u64,
    sender: mpsc::UnboundedSender<LogEvent>,
}

#[derive(Default)]
pub struct LiveLogRegistry {
    connections: RwLock<HashMap<String, Connection>>,
    next_id: AtomicU64,
}

impl LiveLogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for `client_id`, replacing any earlier one.
    pub async fn connect(&self, client_id: &str) -> LogSubscription {
        let (sender, events) = mpsc::unbounded_channel();
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let replaced = self
            .connections
            .write()
            .await
            .insert(client_id.to_string(), Connection { id: connection_id, sender });
        debug!(client_id, connection_id, replaced = replaced.is_some(), "Live log client connected");

        LogSubscription { connection_id, events }
    }

    /// Forget `client_id` if `connection_id` is still its current connection.
    pub async fn disconnect(&self, client_id: &str, connection_id: u64) {
        let mut connections = self.connections.write().await;
        if connections.get(client_id).is_some_and(|c| c.id == connection_id) {
            connections.remove(client_id);
            debug!(client_id, connection_id, "Live log client disconnected");
        }
    }

    /// Deliver a log event to `client_id`. Returns false when the client is
    /// not connected or its connection has gone away.
    pub async fn send(&self, client_id: &str, level: &str, message: &str) -> bool {
        let connections = self.connections.read().await;
        let Some(connection) = connections.get(client_id) else {
            return false;
        };
        connection.sender.send(LogEvent::new(level, message)).is_ok()
    }

    pub async fn is_connected(&self, client_id: &str) -> bool {
        self.connections.read().await.contains_key(client_id)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}
