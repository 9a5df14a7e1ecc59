// ABOUTME: In-memory access token registry enforcing the single-assignment operator lock
// ABOUTME: First operator to present a token claims it; any other operator blocks it for good
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Action Relay Contributors

//! # Token Registry
//!
//! The registry holds one [`TokenRecord`] per access token and enforces the
//! token lifecycle `unassigned → assigned → blocked`:
//!
//! 1. an unknown token is rejected;
//! 2. a blocked token is rejected for everyone, including the operator it
//!    was originally bound to;
//! 3. a token bound to another operator is blocked permanently the moment a
//!    different operator presents it;
//! 4. an unassigned token is bound to the presenting operator;
//! 5. the bound operator may keep using the token.
//!
//! Records live in a [`DashMap`], so each check-and-mutate sequence runs
//! under the per-shard write lock and concurrent requests for the same token
//! cannot interleave between the mismatch check and the block.

use crate::errors::{AppError, AppResult};
use crate::models::{RequestClient, TokenGrant, TokenRecord, TokenStatus, TokenSummary, UsageRecord};
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Capacity of the registry event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Number of leading token characters safe to expose in logs and notices
const TOKEN_PREFIX_LEN: usize = 8;

/// Events emitted by the registry for observers (WebSocket notices, logs)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// A token was permanently blocked for multi-operator use
    TokenBlocked {
        /// Leading characters of the token, never the full value
        token_prefix: String,
        /// Block reason as recorded on the token
        reason: String,
    },
    /// A token was bound to its first operator
    TokenBound {
        token_prefix: String,
        operator_id: String,
    },
}

/// In-memory registry of access tokens
pub struct TokenRegistry {
    tokens: DashMap<String, TokenRecord>,
    events: broadcast::Sender<RegistryEvent>,
}

impl TokenRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tokens: DashMap::new(),
            events,
        }
    }

    /// Create a registry pre-populated with the given tokens
    pub fn with_seed_tokens<I, S>(seed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        for token in seed {
            registry.seed(token.into());
        }
        registry
    }

    /// Register a token if it is not already present
    ///
    /// Existing records are left untouched, so re-seeding never resets an
    /// assignment or clears a block.
    pub fn seed(&self, token: String) {
        self.tokens.entry(token).or_insert_with(TokenRecord::new);
    }

    /// Subscribe to registry events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Authorize one request presenting `token` on behalf of `operator_id`
    ///
    /// The check order is fixed: existence, blocked, operator mismatch,
    /// bind. A mismatch both blocks the token and fails the request.
    ///
    /// # Errors
    ///
    /// - [`ErrorCode::InvalidToken`](crate::errors::ErrorCode::InvalidToken)
    ///   if the token is unknown;
    /// - [`ErrorCode::KeyBlocked`](crate::errors::ErrorCode::KeyBlocked)
    ///   if the token is blocked or got blocked by this very request.
    pub fn authorize(
        &self,
        token: &str,
        operator_id: &str,
        client: &RequestClient,
    ) -> AppResult<TokenGrant> {
        let Some(mut record) = self.tokens.get_mut(token) else {
            return Err(AppError::invalid_token());
        };

        if record.is_blocked() {
            return Err(AppError::key_blocked(
                record.block_reason.as_deref(),
                record.blocked_at,
            ));
        }

        let assigned_operator = record.assigned_operator.clone();
        match assigned_operator {
            Some(assigned) if assigned != operator_id => {
                let reason = format!(
                    "Token used from multiple operators: {assigned} and {operator_id}"
                );
                record.status = TokenStatus::Blocked;
                record.violation_attempts += 1;
                record.blocked_at = Some(Utc::now());
                record.block_reason = Some(reason.clone());

                warn!(
                    token_prefix = %token_prefix(token),
                    assigned_operator = %assigned,
                    violating_operator = %operator_id,
                    "access token blocked for multi-operator use"
                );
                self.emit(RegistryEvent::TokenBlocked {
                    token_prefix: token_prefix(token),
                    reason,
                });

                Err(AppError::key_blocked_violation(&assigned))
            }
            Some(assigned) => Ok(TokenGrant {
                assigned_operator: assigned,
                newly_bound: false,
            }),
            None => {
                record.assigned_operator = Some(operator_id.to_owned());
                record.usage_history.push(UsageRecord {
                    operator_id: operator_id.to_owned(),
                    first_used: Utc::now(),
                    ip: client.ip.clone(),
                    user_agent: client.user_agent.clone(),
                });

                info!(
                    token_prefix = %token_prefix(token),
                    operator_id = %operator_id,
                    "access token bound to operator"
                );
                self.emit(RegistryEvent::TokenBound {
                    token_prefix: token_prefix(token),
                    operator_id: operator_id.to_owned(),
                });

                Ok(TokenGrant {
                    assigned_operator: operator_id.to_owned(),
                    newly_bound: true,
                })
            }
        }
    }

    /// Number of tokens that are not blocked
    #[must_use]
    pub fn active_token_count(&self) -> usize {
        self.tokens.iter().filter(|r| !r.is_blocked()).count()
    }

    /// Total number of registered tokens
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Snapshot of all tokens for the administrative surface
    #[must_use]
    pub fn list_tokens(&self) -> Vec<TokenSummary> {
        self.tokens
            .iter()
            .map(|entry| TokenSummary {
                token_prefix: token_prefix(entry.key()),
                status: entry.status,
                assigned_operator: entry.assigned_operator.clone(),
                violation_attempts: entry.violation_attempts,
                created_at: entry.created_at,
            })
            .collect()
    }

    /// Clone of the record for `token`, if registered
    #[must_use]
    pub fn get(&self, token: &str) -> Option<TokenRecord> {
        self.tokens.get(token).map(|r| r.clone())
    }

    fn emit(&self, event: RegistryEvent) {
        // No receivers is fine; notices are best-effort
        let _ = self.events.send(event);
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Leading characters of a token, safe for logs and notices
#[must_use]
pub fn token_prefix(token: &str) -> String {
    token.chars().take(TOKEN_PREFIX_LEN).collect()
}
