use super::AppState;
use crate::error::{GameError, GameResult};
use crate::types::*;
use indexmap::IndexMap;
use std::collections::HashMap;

impl Session {
    pub fn new(group_id: GroupId) -> Self {
        Self {
            group_id,
            players: IndexMap::new(),
            phase: SessionPhase::Lobby,
            round_no: 1,
            locked: false,
            scores: HashMap::new(),
            assigned: HashMap::new(),
            answers: HashMap::new(),
            prompt_messages: HashMap::new(),
            matchups: Vec::new(),
            polls: HashMap::new(),
            scored_polls: Vec::new(),
            collection_deadline: None,
        }
    }

    /// Add a player to the lobby
    pub fn add_player(&mut self, player: Player, max_players: usize) -> GameResult<()> {
        if self.locked {
            return Err(GameError::Precondition(
                "The game has already begun, cannot join now...".to_string(),
            ));
        }
        if self.players.contains_key(&player.id) {
            return Err(GameError::Conflict(
                "You're already in this game!".to_string(),
            ));
        }
        if self.players.len() >= max_players {
            return Err(GameError::Capacity("The lobby is full!".to_string()));
        }

        self.players.insert(player.id.clone(), player);
        Ok(())
    }

    /// Close the lobby for good
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn player_name(&self, player_id: &PlayerId) -> &str {
        self.players
            .get(player_id)
            .map(Player::name)
            .unwrap_or(NO_NAME)
    }

    /// Comma-separated display names in join order
    pub fn player_names(&self) -> String {
        self.players
            .values()
            .map(Player::name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl AppState {
    /// Join a group's lobby, then greet the player privately.
    ///
    /// A player who cannot be reached privately still joins; the group is
    /// asked to have them open a private chat.
    pub async fn join(
        &self,
        group_id: &GroupId,
        player_id: &PlayerId,
        display_name: Option<String>,
    ) -> GameResult<Player> {
        let handle = self
            .get_session(group_id)
            .await
            .ok_or_else(|| GameError::NotFound("That game no longer exists".to_string()))?;

        let player = Player {
            id: player_id.clone(),
            display_name,
        };
        handle
            .session
            .write()
            .await
            .add_player(player.clone(), self.config.max_players)?;
        tracing::info!("Player {} joined group {}", player_id, group_id);

        let welcome = format!(
            "Welcome {}! You've joined the game. You'll receive your prompts here when the round starts.",
            player.name()
        );
        match self.deliver_direct(player_id, &welcome).await {
            Ok(_) => {
                self.notify_group(group_id, &format!("{} joined the game!", player.name()))
                    .await;
            }
            Err(e) => {
                tracing::warn!("Cannot reach {} privately: {}", player_id, e);
                self.notify_group(
                    group_id,
                    &format!(
                        "{} joined the game, but I can't DM them yet. {}, please start a private chat with me.",
                        player.name(),
                        player.name()
                    ),
                )
                .await;
            }
        }

        Ok(player)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::test_state;
    use super::*;

    fn player(id: &str) -> Player {
        Player {
            id: id.to_string(),
            display_name: Some(id.to_uppercase()),
        }
    }

    #[test]
    fn test_add_player_keeps_join_order() {
        let mut session = Session::new("g".into());
        for id in ["c", "a", "b"] {
            session.add_player(player(id), 8).unwrap();
        }
        let order: Vec<_> = session.players.keys().cloned().collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(session.player_names(), "C, A, B");
    }

    #[test]
    fn test_duplicate_join_conflicts() {
        let mut session = Session::new("g".into());
        session.add_player(player("a"), 8).unwrap();
        let result = session.add_player(player("a"), 8);
        assert!(matches!(result, Err(GameError::Conflict(_))));
        assert_eq!(session.players.len(), 1);
    }

    #[test]
    fn test_capacity() {
        let mut session = Session::new("g".into());
        session.add_player(player("a"), 2).unwrap();
        session.add_player(player("b"), 2).unwrap();
        let result = session.add_player(player("c"), 2);
        assert!(matches!(result, Err(GameError::Capacity(_))));
    }

    #[test]
    fn test_locked_rejects_joins() {
        let mut session = Session::new("g".into());
        session.lock();
        let result = session.add_player(player("a"), 8);
        assert!(matches!(result, Err(GameError::Precondition(_))));
    }

    #[test]
    fn test_missing_name_placeholder() {
        let mut session = Session::new("g".into());
        session
            .add_player(
                Player {
                    id: "x".into(),
                    display_name: None,
                },
                8,
            )
            .unwrap();
        assert_eq!(session.player_name(&"x".to_string()), NO_NAME);
        assert_eq!(session.player_name(&"ghost".to_string()), NO_NAME);
    }

    #[tokio::test]
    async fn test_join_welcomes_player() {
        let (state, transport, _feed) = test_state(vec![]);
        let group = "g1".to_string();
        state.create_session(&group).await.unwrap();

        state
            .join(&group, &"u1".to_string(), Some("Alice".into()))
            .await
            .unwrap();

        assert_eq!(transport.direct_texts("u1").await.len(), 1);
        assert_eq!(transport.group_texts().await, vec!["Alice joined the game!"]);
    }

    #[tokio::test]
    async fn test_join_unreachable_player_degrades_to_group_notice() {
        let (state, transport, _feed) = test_state(vec![]);
        let group = "g1".to_string();
        state.create_session(&group).await.unwrap();
        transport.set_unreachable("u1").await;

        let result = state.join(&group, &"u1".to_string(), Some("Bob".into())).await;
        assert!(result.is_ok());

        let session = state.session_snapshot(&group).await.unwrap();
        assert!(session.players.contains_key("u1"));
        assert!(transport.group_texts().await[0].contains("can't DM them yet"));
    }

    #[tokio::test]
    async fn test_join_without_session() {
        let (state, _, _) = test_state(vec![]);
        let result = state.join(&"g1".to_string(), &"u1".to_string(), None).await;
        assert!(matches!(result, Err(GameError::NotFound(_))));
    }
}
