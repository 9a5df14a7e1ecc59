// ABOUTME: Relayed bot action processing
// ABOUTME: Stub implementation returning randomized counters until real handlers land
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Action Relay Contributors

//! Action processing for relayed operator requests
//!
//! The relay forwards "bot actions" on behalf of an operator. Processing is
//! currently a stub: every action reports success with randomized counters.
//! There is deliberately no dispatch table; unknown action names still
//! process.

use crate::models::{ActionResult, ActionStats};
use chrono::Utc;
use rand::Rng;
use tracing::debug;

/// Upper bound (exclusive) for the stubbed invites counter
const MAX_INVITES: u32 = 10;

/// Upper bound (exclusive) for the stubbed likes counter
const MAX_LIKES: u32 = 5;

/// Process one relayed action for an operator
#[must_use]
pub fn process_action(action: &str, operator_id: &str) -> ActionResult {
    debug!(action = %action, operator_id = %operator_id, "processing relayed action");

    let mut rng = rand::thread_rng();
    ActionResult {
        processed: true,
        action: action.to_owned(),
        operator: operator_id.to_owned(),
        timestamp: Utc::now(),
        stats: ActionStats {
            invites_sent: rng.gen_range(0..MAX_INVITES),
            likes_processed: rng.gen_range(0..MAX_LIKES),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_action_echoes_request() {
        let result = process_action("send_invites", "op-7");
        assert!(result.processed);
        assert_eq!(result.action, "send_invites");
        assert_eq!(result.operator, "op-7");
    }

    #[test]
    fn test_stats_stay_in_range() {
        for _ in 0..100 {
            let result = process_action("anything", "op-1");
            assert!(result.stats.invites_sent < MAX_INVITES);
            assert!(result.stats.likes_processed < MAX_LIKES);
        }
    }

    #[test]
    fn test_unknown_actions_still_process() {
        let result = process_action("definitely_not_registered", "op-1");
        assert!(result.processed);
    }
}
