use super::AppState;
use crate::error::{GameError, GameResult};
use crate::types::*;

impl Session {
    /// Fill the answer slot a prompt message was sent for.
    ///
    /// Only the current round's prompt messages correlate; a genuine answer
    /// is final for the round.
    pub fn record_answer(&mut self, message_ref: &MessageRef, player_id: &PlayerId, text: String) -> GameResult<()> {
        let (owner, slot_idx) = self
            .prompt_messages
            .get(message_ref)
            .cloned()
            .filter(|(owner, _)| owner == player_id)
            .ok_or_else(|| GameError::NotFound("That message isn't a valid prompt".to_string()))?;

        if self.phase != SessionPhase::Collecting {
            return Err(GameError::Precondition(
                "Answers for this round are closed".to_string(),
            ));
        }

        let slot = self
            .answers
            .get_mut(&owner)
            .and_then(|slots| slots.get_mut(slot_idx))
            .ok_or_else(|| GameError::NotFound("That message isn't a valid prompt".to_string()))?;

        match *slot {
            AnswerSlot::Unset => {
                *slot = AnswerSlot::Answered(text);
                Ok(())
            }
            AnswerSlot::Answered(_) => Err(GameError::Conflict(
                "You already answered this prompt".to_string(),
            )),
            AnswerSlot::TimedOut => Err(GameError::Precondition(
                "Answers for this round are closed".to_string(),
            )),
        }
    }
}

impl AppState {
    /// Record a private reply to a prompt message and confirm it to the player
    pub async fn record_reply(&self, message_ref: &MessageRef, player_id: &PlayerId, text: String) -> GameResult<()> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(GameError::Precondition(
                "Your answer is empty".to_string(),
            ));
        }

        let mut owner = None;
        for handle in self.all_sessions().await {
            if handle
                .session
                .read()
                .await
                .prompt_messages
                .contains_key(message_ref)
            {
                owner = Some(handle);
                break;
            }
        }
        let handle = owner.ok_or_else(|| {
            GameError::NotFound("That message isn't a valid prompt".to_string())
        })?;

        handle
            .session
            .write()
            .await
            .record_answer(message_ref, player_id, text)?;

        tracing::debug!("Recorded answer from {} for {}", player_id, message_ref);
        self.notify_player(player_id, "✅ Answer has been recorded")
            .await;
        Ok(())
    }
}
