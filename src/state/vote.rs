use crate::error::{GameError, GameResult};
use crate::state::AppState;
use crate::types::*;

/// Points pool shared by the two answers of one matchup
const POINTS_PER_MATCHUP: f64 = 100.0;

/// Split the matchup pool by vote share; an uncontested poll splits evenly
pub fn poll_points(v1: u32, v2: u32) -> (f64, f64) {
    let total = v1 + v2;
    if total == 0 {
        return (POINTS_PER_MATCHUP / 2.0, POINTS_PER_MATCHUP / 2.0);
    }
    let total = f64::from(total);
    (
        POINTS_PER_MATCHUP * f64::from(v1) / total,
        POINTS_PER_MATCHUP * f64::from(v2) / total,
    )
}

impl Session {
    /// Record a vote; a repeat vote from the same voter replaces the earlier one.
    ///
    /// Votes on a closed poll are kept for audit but never counted.
    pub fn record_vote(&mut self, poll_ref: &PollRef, voter_id: &VoterId, option: usize) -> GameResult<()> {
        let poll = self
            .polls
            .get_mut(poll_ref)
            .ok_or_else(|| GameError::NotFound(format!("Unknown poll {}", poll_ref)))?;

        if poll.closed {
            poll.late_votes.insert(voter_id.clone(), option);
            return Err(GameError::Precondition("This poll is closed".to_string()));
        }

        poll.votes.insert(voter_id.clone(), option);
        Ok(())
    }

    /// Apply a poll's points to the running scores.
    ///
    /// Unknown and already scored polls are ignored. Returns the points
    /// awarded to each participant.
    pub fn score_poll(&mut self, poll_ref: &PollRef) -> Option<[(PlayerId, f64); 2]> {
        if self.scored_polls.contains(poll_ref) {
            return None;
        }
        let poll = self.polls.get(poll_ref)?;
        let matchup = self.matchups.get(poll.matchup)?;

        let (v1, v2) = poll.tally();
        let (p1, p2) = poll_points(v1, v2);
        let awarded = [
            (matchup.entries[0].player_id.clone(), p1),
            (matchup.entries[1].player_id.clone(), p2),
        ];

        for (player_id, points) in &awarded {
            *self.scores.entry(player_id.clone()).or_insert(0.0) += points;
        }
        self.scored_polls.push(poll_ref.clone());

        tracing::debug!(
            "Poll {} scored {}-{} -> {:.2}/{:.2}",
            poll_ref,
            v1,
            v2,
            p1,
            p2
        );
        Some(awarded)
    }
}

impl AppState {
    /// Record a vote arriving from the chat platform.
    ///
    /// The poll is looked up across all sessions, since vote events only
    /// carry the poll ref.
    pub async fn record_vote(&self, poll_ref: &PollRef, voter_id: &VoterId, option: usize) -> GameResult<()> {
        if option > 1 {
            return Err(GameError::Precondition(
                "Polls only have two options".to_string(),
            ));
        }

        for handle in self.all_sessions().await {
            let mut session = handle.session.write().await;
            if session.polls.contains_key(poll_ref) {
                return session.record_vote(poll_ref, voter_id, option);
            }
        }

        Err(GameError::NotFound(format!("Unknown poll {}", poll_ref)))
    }
}
