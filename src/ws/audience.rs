//! Audience message handlers
//!
//! Votes on the matchup polls.

use crate::error::GameError;
use crate::protocol::OutboundAction;
use crate::state::AppState;
use crate::types::{PollRef, VoterId};
use std::sync::Arc;

use super::handlers::error_reply;

pub async fn handle_vote(
    state: &Arc<AppState>,
    poll_ref: PollRef,
    voter_id: VoterId,
    option: usize,
) -> Option<OutboundAction> {
    match state.record_vote(&poll_ref, &voter_id, option).await {
        Ok(()) => {
            tracing::debug!("Vote: {} -> option {} on poll {}", voter_id, option, poll_ref);
            None
        }
        // Stale polls from finished rounds or ended games
        Err(GameError::NotFound(_)) => {
            tracing::debug!("Ignoring vote on unknown poll {}", poll_ref);
            None
        }
        Err(e) => {
            tracing::debug!("Vote from {} on {} not counted: {}", voter_id, poll_ref, e);
            Some(error_reply(&e))
        }
    }
}
