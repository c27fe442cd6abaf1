use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque ID types for type safety
pub type GroupId = String;
pub type PlayerId = String;
pub type VoterId = String;
pub type PromptId = String;
pub type MessageRef = String;
pub type PollRef = String;

/// Shown instead of a missing display name
pub const NO_NAME: &str = "No-Name";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    Lobby,
    Locked,
    Collecting,
    Voting,
    Scored,
    Idle,
    /// Terminal; only observable on a session detached from the registry
    Ended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: Option<String>,
}

impl Player {
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(NO_NAME)
    }
}

/// One participant of a matchup: the player and the index of the answer slot
/// holding their answer to the shared prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchupEntry {
    pub player_id: PlayerId,
    pub slot: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matchup {
    pub round_no: u32,
    pub prompt_id: PromptId,
    pub prompt_text: String,
    pub entries: [MatchupEntry; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum AnswerSlot {
    Unset,
    Answered(String),
    /// Backfilled at the collection deadline
    TimedOut,
}

impl AnswerSlot {
    pub fn is_unset(&self) -> bool {
        matches!(self, AnswerSlot::Unset)
    }

    /// Text shown in the poll; placeholders render as `fallback`
    pub fn display<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self {
            AnswerSlot::Answered(text) => text,
            AnswerSlot::Unset | AnswerSlot::TimedOut => fallback,
        }
    }
}

/// A prompt assigned to a player for the current round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedPrompt {
    pub prompt_id: PromptId,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub poll_ref: PollRef,
    /// Index into the session's matchups
    pub matchup: usize,
    pub votes: HashMap<VoterId, usize>,
    pub closed: bool,
    /// Votes that arrived after close, kept for audit only
    #[serde(default)]
    pub late_votes: HashMap<VoterId, usize>,
    pub opened_at: String,
}

impl Poll {
    pub fn new(poll_ref: PollRef, matchup: usize) -> Self {
        Self {
            poll_ref,
            matchup,
            votes: HashMap::new(),
            closed: false,
            late_votes: HashMap::new(),
            opened_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Counts for option 0 and option 1
    pub fn tally(&self) -> (u32, u32) {
        self.votes
            .values()
            .fold((0, 0), |(v1, v2), &choice| match choice {
                0 => (v1 + 1, v2),
                _ => (v1, v2 + 1),
            })
    }
}

/// One group's game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub group_id: GroupId,
    pub players: IndexMap<PlayerId, Player>,
    pub phase: SessionPhase,
    pub round_no: u32,
    pub locked: bool,
    pub scores: HashMap<PlayerId, f64>,
    pub assigned: HashMap<PlayerId, Vec<AssignedPrompt>>,
    pub answers: HashMap<PlayerId, Vec<AnswerSlot>>,
    /// Prompt message ref -> (player, slot) for reply correlation
    pub prompt_messages: HashMap<MessageRef, (PlayerId, usize)>,
    pub matchups: Vec<Matchup>,
    pub polls: HashMap<PollRef, Poll>,
    /// Polls whose points have been applied this round
    pub scored_polls: Vec<PollRef>,
    pub collection_deadline: Option<String>,
}

/// A scoreboard line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreLine {
    pub player_id: PlayerId,
    pub display_name: String,
    pub score: f64,
}
