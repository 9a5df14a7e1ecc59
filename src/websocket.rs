// ABOUTME: WebSocket notice broadcasting for connected relay clients
// ABOUTME: Push-only channel; clients receive JSON notices and send nothing back
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Action Relay Contributors

//! `WebSocket` notice support
//!
//! The relay's WebSocket surface is write-only broadcast: connected clients
//! receive block notices and periodic system statistics, and there is no
//! client-driven protocol. Inbound frames are ignored apart from close
//! handling (ping/pong is handled by the framework).

use crate::token_registry::{RegistryEvent, TokenRegistry};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, Duration};
use tracing::{debug, warn};
use uuid::Uuid;

// WebSocket message type alias for Axum
type Message = axum::extract::ws::Message;

/// Default interval between periodic system stats notices
const STATS_INTERVAL: Duration = Duration::from_secs(30);

/// Notices pushed to connected WebSocket clients
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayNotice {
    /// A token was permanently blocked
    #[serde(rename = "token_blocked")]
    TokenBlocked {
        /// Leading token characters, never the full value
        token_prefix: String,
        /// Recorded block reason
        reason: String,
    },
    /// Periodic system statistics
    #[serde(rename = "system_stats")]
    SystemStats {
        /// Non-blocked tokens in the registry
        active_tokens: usize,
        /// Currently connected WebSocket clients
        connected_clients: usize,
    },
    /// Free-form operational message
    #[serde(rename = "notice")]
    Notice {
        /// Message text
        message: String,
    },
}

/// Manages WebSocket connections and notice broadcasting
#[derive(Clone)]
pub struct WebSocketManager {
    registry: Arc<TokenRegistry>,
    clients: Arc<RwLock<HashMap<Uuid, mpsc::UnboundedSender<Message>>>>,
    stats_interval: Duration,
}

impl WebSocketManager {
    /// Create a new WebSocket manager over the given registry
    #[must_use]
    pub fn new(registry: Arc<TokenRegistry>) -> Self {
        Self {
            registry,
            clients: Arc::new(RwLock::new(HashMap::new())),
            stats_interval: STATS_INTERVAL,
        }
    }

    /// Override the stats broadcast interval
    ///
    /// Connection state stays shared with the manager this was cloned from,
    /// so a re-timed clone still reaches the same clients.
    #[must_use]
    pub fn with_stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }

    /// Handle one upgraded WebSocket connection until it closes
    pub async fn handle_connection(&self, ws: axum::extract::ws::WebSocket) {
        let (mut ws_tx, mut ws_rx) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let connection_id = Uuid::new_v4();
        self.clients.write().await.insert(connection_id, tx);
        debug!(connection_id = %connection_id, "WebSocket client connected");

        // Forward queued notices to the socket
        let ws_send_task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if ws_tx.send(message).await.is_err() {
                    break;
                }
            }
        });

        // Drain inbound frames; the channel is push-only, so everything
        // except close is discarded
        while let Some(msg) = ws_rx.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }

        ws_send_task.abort();
        self.clients.write().await.remove(&connection_id);
        debug!(connection_id = %connection_id, "WebSocket client disconnected");
    }

    /// Number of currently connected clients
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Broadcast a notice to every connected client
    ///
    /// Clients whose forwarding channel is gone are dropped from the map.
    pub async fn broadcast(&self, notice: &RelayNotice) {
        let text = match serde_json::to_string(notice) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to serialize WebSocket notice");
                return;
            }
        };

        let mut dead = Vec::new();
        {
            let clients = self.clients.read().await;
            for (id, tx) in clients.iter() {
                if tx.send(Message::Text(text.clone())).is_err() {
                    dead.push(*id);
                }
            }
        }

        if !dead.is_empty() {
            let mut clients = self.clients.write().await;
            for id in dead {
                clients.remove(&id);
            }
        }
    }

    /// Start the background task that turns registry events into notices
    pub fn start_event_forwarder(&self) {
        let manager = self.clone();
        let mut events = self.registry.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(RegistryEvent::TokenBlocked {
                        token_prefix,
                        reason,
                    }) => {
                        manager
                            .broadcast(&RelayNotice::TokenBlocked {
                                token_prefix,
                                reason,
                            })
                            .await;
                    }
                    Ok(RegistryEvent::TokenBound { .. }) => {
                        // Bind events are logged but not pushed to clients
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "WebSocket forwarder lagged behind registry events");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Start the background task broadcasting periodic system stats
    pub fn start_periodic_updates(&self) {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(manager.stats_interval);
            // The first tick fires immediately; skip it so freshly started
            // servers do not race their own startup notices
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let notice = RelayNotice::SystemStats {
                    active_tokens: manager.registry.active_token_count(),
                    connected_clients: manager.client_count().await,
                };
                manager.broadcast(&notice).await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_serialization_tags() {
        let notice = RelayNotice::TokenBlocked {
            token_prefix: "demo_key".into(),
            reason: "multi-operator use".into(),
        };
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["type"], "token_blocked");
        assert_eq!(json["token_prefix"], "demo_key");

        let stats = RelayNotice::SystemStats {
            active_tokens: 2,
            connected_clients: 1,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["type"], "system_stats");
        assert_eq!(json["active_tokens"], 2);
    }

    #[tokio::test]
    async fn test_client_count_starts_empty() {
        let manager = WebSocketManager::new(Arc::new(TokenRegistry::new()));
        assert_eq!(manager.client_count().await, 0);
    }

    #[test]
    fn test_stats_interval_defaults_and_overrides() {
        let manager = WebSocketManager::new(Arc::new(TokenRegistry::new()));
        assert_eq!(manager.stats_interval, STATS_INTERVAL);

        let retimed = manager.with_stats_interval(Duration::from_millis(50));
        assert_eq!(retimed.stats_interval, Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_broadcast_without_clients_is_noop() {
        let manager = WebSocketManager::new(Arc::new(TokenRegistry::new()));
        manager
            .broadcast(&RelayNotice::Notice {
                message: "hello".into(),
            })
            .await;
        assert_eq!(manager.client_count().await, 0);
    }
}
