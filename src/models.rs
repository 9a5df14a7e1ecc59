// ABOUTME: Core data structures for tokens, action requests, and wire-level responses
// ABOUTME: Defines the token record lifecycle types and the /api request/response DTOs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Action Relay Contributors

//! Common data models shared across the relay

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    /// Token may be used (bound or not yet bound)
    Active,
    /// Token is permanently blocked
    Blocked,
}

/// A single usage entry recorded when a token is first bound to an operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Operator the token was bound to
    pub operator_id: String,
    /// When the binding happened
    pub first_used: DateTime<Utc>,
    /// Client IP at bind time, if known
    pub ip: Option<String>,
    /// Client user agent at bind time, if known
    pub user_agent: Option<String>,
}

/// In-memory record for one access token
///
/// Lifecycle: unassigned → assigned (first operator to present the token
/// claims it) → blocked (any other operator presents it). Blocked is
/// terminal; nothing un-blocks a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Operator this token is bound to, `None` until first use
    pub assigned_operator: Option<String>,
    /// Current status
    pub status: TokenStatus,
    /// When the token was registered
    pub created_at: DateTime<Utc>,
    /// When the token was blocked, if it was
    pub blocked_at: Option<DateTime<Utc>>,
    /// Why the token was blocked, if it was
    pub block_reason: Option<String>,
    /// Number of rejected cross-operator attempts
    pub violation_attempts: u32,
    /// Bind history (at most one entry under the current policy)
    pub usage_history: Vec<UsageRecord>,
}

impl TokenRecord {
    /// Create a fresh, unassigned record
    #[must_use]
    pub fn new() -> Self {
        Self {
            assigned_operator: None,
            status: TokenStatus::Active,
            created_at: Utc::now(),
            blocked_at: None,
            block_reason: None,
            violation_attempts: 0,
            usage_history: Vec::new(),
        }
    }

    /// Whether this token is permanently blocked
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.status == TokenStatus::Blocked
    }
}

impl Default for TokenRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Client metadata captured from the incoming HTTP request
#[derive(Debug, Clone, Default)]
pub struct RequestClient {
    /// Remote peer address
    pub ip: Option<String>,
    /// `User-Agent` header value
    pub user_agent: Option<String>,
}

/// Successful token authorization outcome
#[derive(Debug, Clone)]
pub struct TokenGrant {
    /// Operator the token is bound to after this request
    pub assigned_operator: String,
    /// Whether this request performed the initial binding
    pub newly_bound: bool,
}

/// Query parameters accepted by `POST /api`
///
/// All fields are optional at the extractor level so the handler can report
/// precisely which required field is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionParams {
    /// Access token presented by the client
    pub user_token: Option<String>,
    /// Operator identifier the request acts on behalf of
    pub operator_id: Option<String>,
    /// Name of the relayed action
    pub action: Option<String>,
    /// Opaque payload digest, accepted and currently unused
    pub payload_hash: Option<String>,
}

/// Random counters returned by the action stub
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionStats {
    pub invites_sent: u32,
    pub likes_processed: u32,
}

/// Result of processing one relayed action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub processed: bool,
    pub action: String,
    pub operator: String,
    pub timestamp: DateTime<Utc>,
    pub stats: ActionStats,
}

/// Response body for a successful `POST /api`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub data: ActionResult,
    /// Fresh session identifier, one per response
    pub sid: uuid::Uuid,
    /// WebSocket endpoint derived from the request host
    pub wss_url: String,
    /// Fresh per-response auth handle
    pub auth: uuid::Uuid,
    /// Operator the token is bound to
    pub operator_assigned: String,
}

/// Administrative view of one token, full token value never included
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSummary {
    /// First characters of the token, for identification only
    pub token_prefix: String,
    pub status: TokenStatus,
    pub assigned_operator: Option<String>,
    pub violation_attempts: u32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_token_record_is_unassigned_and_active() {
        let record = TokenRecord::new();
        assert!(record.assigned_operator.is_none());
        assert_eq!(record.status, TokenStatus::Active);
        assert!(!record.is_blocked());
        assert!(record.usage_history.is_empty());
        assert_eq!(record.violation_attempts, 0);
    }

    #[test]
    fn test_token_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TokenStatus::Blocked).unwrap(),
            "\"blocked\""
        );
        assert_eq!(
            serde_json::to_string(&TokenStatus::Active).unwrap(),
            "\"active\""
        );
    }

    #[test]
    fn test_action_params_from_query_string() {
        let params: ActionParams =
            serde_json::from_value(serde_json::json!({
                "user_token": "demo_key_12345",
                "operator_id": "op-1",
                "action": "send_invites"
            }))
            .unwrap();
        assert_eq!(params.user_token.as_deref(), Some("demo_key_12345"));
        assert!(params.payload_hash.is_none());
    }
}
