// ABOUTME: Server health monitoring for operational visibility
// ABOUTME: Provides uptime tracking and the /health response payload
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Action Relay Contributors

//! Health check support

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" while the process is serving
    pub status: String,
    /// Response timestamp
    pub timestamp: DateTime<Utc>,
    /// Number of non-blocked tokens in the registry
    pub active_tokens: usize,
    /// Seconds since the server started
    pub uptime_seconds: u64,
    /// Currently connected WebSocket clients
    pub websocket_clients: usize,
}

/// Tracks process start time for uptime reporting
#[derive(Debug, Clone, Copy)]
pub struct HealthChecker {
    start_time: Instant,
}

impl HealthChecker {
    /// Create a checker anchored at the current instant
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Build the health payload from current counters
    #[must_use]
    pub fn check(&self, active_tokens: usize, websocket_clients: usize) -> HealthResponse {
        HealthResponse {
            status: "ok".into(),
            timestamp: Utc::now(),
            active_tokens,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            websocket_clients,
        }
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_shape() {
        let checker = HealthChecker::new();
        let response = checker.check(3, 1);
        assert_eq!(response.status, "ok");
        assert_eq!(response.active_tokens, 3);
        assert_eq!(response.websocket_clients, 1);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["timestamp"].is_string());
    }
}
