// ABOUTME: Server resource wiring and the unified HTTP/WebSocket listener
// ABOUTME: Owns the shared registry, broadcaster, and health checker for all routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Action Relay Contributors

//! Server assembly
//!
//! [`ServerResources`] bundles the shared state every route handler needs;
//! [`RelayServer`] binds the listener and serves the router.

use crate::config::ServerConfig;
use crate::health::HealthChecker;
use crate::routes::RelayRoutes;
use crate::token_registry::TokenRegistry;
use crate::websocket::WebSocketManager;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Shared state injected into every route handler
pub struct ServerResources {
    /// Runtime configuration
    pub config: ServerConfig,
    /// Access token registry
    pub registry: Arc<TokenRegistry>,
    /// WebSocket notice broadcaster
    pub websocket: WebSocketManager,
    /// Uptime tracker for /health
    pub health: HealthChecker,
}

impl ServerResources {
    /// Build resources from configuration, seeding the registry
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(TokenRegistry::with_seed_tokens(
            config.seed_tokens.iter().cloned(),
        ));
        let websocket = WebSocketManager::new(Arc::clone(&registry));

        Self {
            config,
            registry,
            websocket,
            health: HealthChecker::new(),
        }
    }
}

/// The relay server
pub struct RelayServer {
    resources: Arc<ServerResources>,
}

impl RelayServer {
    /// Create a server over prepared resources
    #[must_use]
    pub fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Bind and serve until the process is stopped
    ///
    /// Starts the WebSocket background tasks (registry event forwarding and
    /// periodic stats) before accepting connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind or the server fails.
    pub async fn run(self, port: u16) -> Result<()> {
        self.resources.websocket.start_event_forwarder();
        self.resources.websocket.start_periodic_updates();

        let addr = format!("{}:{}", self.resources.config.host, port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        info!(
            addr = %addr,
            tokens = self.resources.registry.token_count(),
            "relay listening (HTTP and WebSocket)"
        );

        let app = RelayRoutes::router(self.resources);
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .context("server error")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    fn test_config() -> ServerConfig {
        ServerConfig {
            http_port: 0,
            host: "127.0.0.1".into(),
            environment: Environment::Testing,
            cors_allowed_origins: "*".into(),
            seed_tokens: vec!["test_key".into()],
        }
    }

    #[test]
    fn test_resources_seed_registry() {
        let resources = ServerResources::new(test_config());
        assert_eq!(resources.registry.token_count(), 1);
        assert_eq!(resources.registry.active_token_count(), 1);
    }
}
