// ABOUTME: Main library entry point for the action relay service
// ABOUTME: HTTP/WebSocket relay with single-assignment operator-locked access tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Action Relay Contributors

#![deny(unsafe_code)]

//! # Action Relay
//!
//! A small HTTP/WebSocket relay that accepts requests tagged with an
//! operator identifier and an action name. Access is controlled by a
//! single-assignment token model: the first operator to present a token
//! claims it, and any other operator presenting the same token blocks it
//! permanently.
//!
//! ## Architecture
//!
//! - **Token registry**: in-memory operator-lock state machine
//! - **Routes**: `POST /api`, `GET /health`, `GET /tokens`, `GET /ws`
//! - **WebSocket**: push-only notice broadcast to connected clients
//! - **Config**: environment-only via [`config::ServerConfig::from_env`]

/// Relayed bot action processing
pub mod actions;

/// Environment-based configuration
pub mod config;

/// Unified error handling with stable error codes
pub mod errors;

/// Health check support
pub mod health;

/// Structured logging setup
pub mod logging;

/// Common data models
pub mod models;

/// HTTP route handlers
pub mod routes;

/// Server resource wiring and listener
pub mod server;

/// Access token registry and operator lock
pub mod token_registry;

/// WebSocket notice broadcasting
pub mod websocket;
