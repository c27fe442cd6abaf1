//! Player message handlers
//!
//! Private replies carrying answers to prompts.

use crate::protocol::OutboundAction;
use crate::state::AppState;
use crate::types::{MessageRef, PlayerId};
use std::sync::Arc;

use super::handlers::error_reply;

pub async fn handle_reply(
    state: &Arc<AppState>,
    message_ref: MessageRef,
    user_id: PlayerId,
    text: String,
) -> Option<OutboundAction> {
    match state.record_reply(&message_ref, &user_id, text).await {
        Ok(()) => None,
        Err(e) => {
            tracing::debug!("Reply from {} to {} rejected: {}", user_id, message_ref, e);
            state.notify_player(&user_id, &e.to_string()).await;
            Some(error_reply(&e))
        }
    }
}

/// A private message that is not a reply cannot be matched to a prompt
pub async fn handle_direct_message(
    state: &Arc<AppState>,
    user_id: PlayerId,
    text: String,
) -> Option<OutboundAction> {
    tracing::debug!("Unthreaded message from {}: {}", user_id, text);
    state
        .notify_player(&user_id, "Please reply to the prompt message when it arrives")
        .await;
    None
}
