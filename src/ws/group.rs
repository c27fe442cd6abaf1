//! Group command handlers
//!
//! Engine errors are answered with a group notice; the session is left as it was.

use crate::error::GameResult;
use crate::protocol::{Command, OutboundAction};
use crate::state::AppState;
use crate::types::{GroupId, PlayerId};
use std::sync::Arc;

use super::handlers::error_reply;

pub async fn handle_command(
    state: &Arc<AppState>,
    group_id: GroupId,
    user_id: PlayerId,
    display_name: Option<String>,
    command: Command,
) -> Option<OutboundAction> {
    tracing::info!("Command {:?} from {} in group {}", command, user_id, group_id);

    let result = match command {
        Command::InitGame => handle_init_game(state, &group_id).await,
        Command::Join => state
            .join(&group_id, &user_id, display_name)
            .await
            .map(|_| ()),
        Command::StartGame => state.start_game(&group_id).await.map(|_| ()),
        Command::NextRound => state.next_round(&group_id).await.map(|_| ()),
        Command::EndGame => handle_end_game(state, &group_id).await,
    };

    match result {
        Ok(()) => None,
        Err(e) => {
            tracing::info!("Command {:?} rejected in {}: {}", command, group_id, e);
            state.notify_group(&group_id, &e.to_string()).await;
            Some(error_reply(&e))
        }
    }
}

async fn handle_init_game(state: &Arc<AppState>, group_id: &GroupId) -> GameResult<()> {
    state.create_session(group_id).await?;
    state
        .notify_group(
            group_id,
            "🕹 New lobby created! Use /join to enter. When ready, use /start_game to begin.",
        )
        .await;
    Ok(())
}

async fn handle_end_game(state: &Arc<AppState>, group_id: &GroupId) -> GameResult<()> {
    state.end_session(group_id).await?;
    state
        .notify_group(
            group_id,
            "🛑 The current game has been ended. All systems reset.",
        )
        .await;
    Ok(())
}
