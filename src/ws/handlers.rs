//! Bridge event dispatch
//!
//! Entry point for everything the chat-platform bridge reports. Events are
//! routed to the group, player and audience handler modules.

use crate::error::GameError;
use crate::protocol::{BridgeEvent, OutboundAction};
use crate::state::AppState;
use crate::transport::BridgeTransport;
use std::sync::Arc;

use super::{audience, group, player};

/// Turn an engine error into the reply sent back over the bridge socket
pub(crate) fn error_reply(e: &GameError) -> OutboundAction {
    OutboundAction::Error {
        code: e.code().to_string(),
        msg: e.to_string(),
    }
}

/// Handle a bridge event and return an optional reply for the bridge
pub async fn handle_event(
    event: BridgeEvent,
    state: &Arc<AppState>,
    bridge: &BridgeTransport,
) -> Option<OutboundAction> {
    match event {
        BridgeEvent::Command {
            group_id,
            user_id,
            display_name,
            command,
        } => group::handle_command(state, group_id, user_id, display_name, command).await,

        BridgeEvent::Reply {
            message_ref,
            user_id,
            text,
        } => player::handle_reply(state, message_ref, user_id, text).await,

        BridgeEvent::DirectMessage { user_id, text } => {
            player::handle_direct_message(state, user_id, text).await
        }

        BridgeEvent::PrivateChatOpened { user_id } => {
            bridge.mark_reachable(&user_id).await;
            None
        }

        BridgeEvent::Vote {
            poll_ref,
            voter_id,
            option,
        } => audience::handle_vote(state, poll_ref, voter_id, option).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::PromptPool;
    use crate::protocol::Command;
    use crate::transport::MemoryTransport;
    use crate::types::SessionPhase;

    fn setup() -> (Arc<AppState>, Arc<MemoryTransport>, BridgeTransport) {
        let (transport, _feed) = MemoryTransport::new();
        let transport = Arc::new(transport);
        let state = Arc::new(AppState::new(
            crate::config::GameConfig::default(),
            transport.clone(),
            Arc::new(PromptPool::new(vec!["Q".into()])),
        ));
        (state, transport, BridgeTransport::new())
    }

    fn command(user: &str, command: Command) -> BridgeEvent {
        BridgeEvent::Command {
            group_id: "g1".into(),
            user_id: user.into(),
            display_name: Some(user.to_uppercase()),
            command,
        }
    }

    #[tokio::test]
    async fn test_init_twice_reports_conflict() {
        let (state, transport, bridge) = setup();

        assert!(handle_event(command("a", Command::InitGame), &state, &bridge)
            .await
            .is_none());
        let reply = handle_event(command("a", Command::InitGame), &state, &bridge).await;

        match reply {
            Some(OutboundAction::Error { code, .. }) => assert_eq!(code, "CONFLICT"),
            other => panic!("Expected conflict, got {:?}", other),
        }
        let texts = transport.group_texts().await;
        assert_eq!(texts.last().unwrap(), "A game already exists");
    }

    #[tokio::test]
    async fn test_start_with_one_player_is_rejected() {
        let (state, _, bridge) = setup();
        handle_event(command("a", Command::InitGame), &state, &bridge).await;
        handle_event(command("a", Command::Join), &state, &bridge).await;

        let reply = handle_event(command("a", Command::StartGame), &state, &bridge).await;
        assert!(matches!(reply, Some(OutboundAction::Error { .. })));

        let session = state.session_snapshot(&"g1".to_string()).await.unwrap();
        assert_eq!(session.phase, SessionPhase::Lobby);
        assert!(!session.locked);
    }

    #[tokio::test]
    async fn test_end_game_announces() {
        let (state, transport, bridge) = setup();
        handle_event(command("a", Command::InitGame), &state, &bridge).await;
        assert!(handle_event(command("a", Command::EndGame), &state, &bridge)
            .await
            .is_none());

        assert!(state.get_session(&"g1".to_string()).await.is_none());
        assert!(transport
            .group_texts()
            .await
            .iter()
            .any(|t| t.contains("has been ended")));

        let reply = handle_event(command("a", Command::EndGame), &state, &bridge).await;
        assert!(matches!(reply, Some(OutboundAction::Error { ref code, .. }) if code == "NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_uncorrelated_reply_notifies_player() {
        let (state, transport, bridge) = setup();
        let event = BridgeEvent::Reply {
            message_ref: "nope".into(),
            user_id: "a".into(),
            text: "hi".into(),
        };

        let reply = handle_event(event, &state, &bridge).await;
        assert!(matches!(reply, Some(OutboundAction::Error { .. })));
        assert_eq!(
            transport.direct_texts("a").await,
            vec!["That message isn't a valid prompt"]
        );
    }

    #[tokio::test]
    async fn test_stale_vote_is_silent() {
        let (state, _, bridge) = setup();
        let event = BridgeEvent::Vote {
            poll_ref: "gone".into(),
            voter_id: "v1".into(),
            option: 0,
        };
        assert!(handle_event(event, &state, &bridge).await.is_none());
    }

    #[tokio::test]
    async fn test_private_chat_opened_marks_reachable() {
        let (state, _, bridge) = setup();
        let _rx = bridge.subscribe();
        let event = BridgeEvent::PrivateChatOpened {
            user_id: "a".into(),
        };
        assert!(handle_event(event, &state, &bridge).await.is_none());

        use crate::transport::ChatTransport;
        assert!(bridge.send_direct(&"a".to_string(), "hi").await.is_ok());
    }
}
