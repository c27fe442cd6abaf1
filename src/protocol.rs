use crate::types::*;
use serde::{Deserialize, Serialize};

/// Commands a chat participant can issue in a group
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    InitGame,
    Join,
    StartGame,
    NextRound,
    EndGame,
}

/// Events delivered by the chat-platform bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum BridgeEvent {
    Command {
        group_id: GroupId,
        user_id: PlayerId,
        display_name: Option<String>,
        command: Command,
    },
    /// A private reply to a message the engine sent earlier
    Reply {
        message_ref: MessageRef,
        user_id: PlayerId,
        text: String,
    },
    /// A private message that does not reply to anything
    DirectMessage {
        user_id: PlayerId,
        text: String,
    },
    Vote {
        poll_ref: PollRef,
        voter_id: VoterId,
        option: usize,
    },
    /// The user opened a private chat, so direct messages can reach them now
    PrivateChatOpened {
        user_id: PlayerId,
    },
}

/// Actions the engine asks the bridge to perform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum OutboundAction {
    SendDirect {
        message_ref: MessageRef,
        player_id: PlayerId,
        text: String,
    },
    SendGroup {
        group_id: GroupId,
        text: String,
    },
    OpenPoll {
        poll_ref: PollRef,
        group_id: GroupId,
        question: String,
        options: [String; 2],
    },
    Error {
        code: String,
        msg: String,
    },
}
