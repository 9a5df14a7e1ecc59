// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides resource construction, router helpers, and a live test server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Action Relay Contributors

#![allow(dead_code)]

//! Shared test utilities for `action_relay`

use action_relay::{
    config::{Environment, ServerConfig},
    routes::RelayRoutes,
    server::ServerResources,
};
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Configuration used by integration tests
pub fn test_config(seed_tokens: &[&str]) -> ServerConfig {
    ServerConfig {
        http_port: 0,
        host: "127.0.0.1".into(),
        environment: Environment::Testing,
        cors_allowed_origins: "*".into(),
        seed_tokens: seed_tokens.iter().map(|s| (*s).to_owned()).collect(),
    }
}

/// Build shared server resources seeded with the given tokens
pub fn test_resources(seed_tokens: &[&str]) -> Arc<ServerResources> {
    init_test_logging();
    Arc::new(ServerResources::new(test_config(seed_tokens)))
}

/// Build the application router over the given resources
pub fn test_router(resources: Arc<ServerResources>) -> axum::Router {
    RelayRoutes::router(resources)
}

/// Serve the router on an ephemeral port and return the bound address
///
/// Starts the WebSocket background tasks the same way the real server does.
pub async fn spawn_test_server(resources: Arc<ServerResources>) -> Result<SocketAddr> {
    resources.websocket.start_event_forwarder();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = test_router(resources);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    Ok(addr)
}
