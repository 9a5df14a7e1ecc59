// ABOUTME: HTTP route handlers for the relay API, health, and WebSocket upgrade
// ABOUTME: Wires query parsing, token authorization, and action processing into axum
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Action Relay Contributors

//! HTTP surface of the relay
//!
//! Three endpoints: `POST /api` for relayed actions, `GET /health` for
//! probes, and `GET /ws` for the push-only notice channel. Request
//! parameters for `/api` arrive in the query string.

use crate::actions::process_action;
use crate::errors::{AppError, AppResult};
use crate::models::{ActionParams, ActionResponse, RequestClient, TokenSummary};
use crate::server::ServerResources;
use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        ConnectInfo, Query, State,
    },
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use http::header::{HeaderMap, HOST, USER_AGENT};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

/// Relay routes implementation
pub struct RelayRoutes;

impl RelayRoutes {
    /// Build the full application router over shared server resources
    pub fn router(resources: Arc<ServerResources>) -> Router {
        let cors = setup_cors(&resources.config.cors_allowed_origins);

        Router::new()
            .route("/health", get(handle_health))
            .route("/api", post(handle_action))
            .route("/tokens", get(handle_list_tokens))
            .route("/ws", get(handle_websocket))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(resources)
    }
}

/// Configure CORS from the comma-separated origin allow-list
///
/// "*" or an empty list permits any origin, matching the original
/// deployment's blanket CORS behavior.
fn setup_cors(allowed_origins: &str) -> CorsLayer {
    let allow_origin = if allowed_origins.is_empty() || allowed_origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<http::HeaderValue> = allowed_origins
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    http::HeaderValue::from_str(trimmed).ok()
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::OPTIONS])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
}

/// `GET /health`
async fn handle_health(State(resources): State<Arc<ServerResources>>) -> impl IntoResponse {
    let response = resources.health.check(
        resources.registry.active_token_count(),
        resources.websocket.client_count().await,
    );
    Json(response)
}

/// `GET /tokens` — administrative listing, token values redacted
async fn handle_list_tokens(
    State(resources): State<Arc<ServerResources>>,
) -> Json<Vec<TokenSummary>> {
    Json(resources.registry.list_tokens())
}

/// `POST /api` — authorize the token and relay the action
async fn handle_action(
    State(resources): State<Arc<ServerResources>>,
    Query(params): Query<ActionParams>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> AppResult<Json<ActionResponse>> {
    let user_token = params
        .user_token
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::missing_field("user_token"))?;
    let operator_id = params
        .operator_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::missing_field("operator_id"))?;
    let action = params
        .action
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::missing_field("action"))?;

    info!(action = %action, operator_id = %operator_id, "relay request received");

    let client = request_client(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let grant = resources
        .registry
        .authorize(user_token, operator_id, &client)?;
    if grant.newly_bound {
        debug!(operator_id = %operator_id, "token bound on this request");
    }

    let data = process_action(action, operator_id);

    Ok(Json(ActionResponse {
        success: true,
        data,
        sid: Uuid::new_v4(),
        wss_url: websocket_url(&headers),
        auth: Uuid::new_v4(),
        operator_assigned: grant.assigned_operator,
    }))
}

/// `GET /ws` — upgrade and hand the socket to the manager
async fn handle_websocket(
    ws: WebSocketUpgrade,
    State(resources): State<Arc<ServerResources>>,
) -> impl IntoResponse {
    debug!("new WebSocket connection request");
    ws.on_upgrade(move |socket: WebSocket| async move {
        resources.websocket.handle_connection(socket).await;
    })
}

/// Extract client metadata for the token usage history
///
/// Prefers `X-Forwarded-For` (first hop) over the socket peer address so
/// deployments behind a proxy record the real client.
fn request_client(headers: &HeaderMap, peer: Option<SocketAddr>) -> RequestClient {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_owned());

    RequestClient {
        ip: forwarded.or_else(|| peer.map(|addr| addr.ip().to_string())),
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    }
}

/// Derive the advertised WebSocket URL from the request host
fn websocket_url(headers: &HeaderMap) -> String {
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("wss://{host}/ws")
}
