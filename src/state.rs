mod answer;
mod round;
mod score;
mod session;
mod vote;

pub use score::format_scoreboard;
pub use vote::poll_points;

use crate::config::GameConfig;
use crate::error::{GameError, GameResult};
use crate::prompts::PromptSource;
use crate::transport::ChatTransport;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Registry entry for one group's game.
///
/// The token is cancelled when the session ends; every round task spawned for
/// the session holds a clone and stops at its next suspension point.
#[derive(Clone)]
pub struct SessionHandle {
    pub session: Arc<RwLock<Session>>,
    pub cancel: CancellationToken,
}

/// Shared application state: the session registry plus the collaborators
/// every session uses
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<GroupId, SessionHandle>>>,
    pub transport: Arc<dyn ChatTransport>,
    pub prompts: Arc<dyn PromptSource>,
    pub config: Arc<GameConfig>,
}

impl AppState {
    pub fn new(
        config: GameConfig,
        transport: Arc<dyn ChatTransport>,
        prompts: Arc<dyn PromptSource>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            transport,
            prompts,
            config: Arc::new(config),
        }
    }

    /// Create the session for a group; at most one may exist per group
    pub async fn create_session(&self, group_id: &GroupId) -> GameResult<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(group_id) {
            return Err(GameError::Conflict("A game already exists".to_string()));
        }

        let handle = SessionHandle {
            session: Arc::new(RwLock::new(Session::new(group_id.clone()))),
            cancel: CancellationToken::new(),
        };
        sessions.insert(group_id.clone(), handle.clone());
        tracing::info!("Created session for group {}", group_id);
        Ok(handle)
    }

    /// Look up the session of a group
    pub async fn get_session(&self, group_id: &GroupId) -> Option<SessionHandle> {
        self.sessions.read().await.get(group_id).cloned()
    }

    /// Snapshot of a group's session
    pub async fn session_snapshot(&self, group_id: &GroupId) -> Option<Session> {
        let handle = self.get_session(group_id).await?;
        let session = handle.session.read().await;
        Some(session.clone())
    }

    /// Remove a group's session and stop its round task.
    ///
    /// The token is cancelled while holding the session's write lock, so a
    /// round task that checks it under the same lock never writes afterwards.
    pub async fn end_session(&self, group_id: &GroupId) -> GameResult<()> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(group_id)
            .ok_or_else(|| GameError::NotFound("No active game to end".to_string()))?;

        let mut session = handle.session.write().await;
        handle.cancel.cancel();
        session.phase = SessionPhase::Ended;
        tracing::info!(
            "Ended session for group {} after {} round(s)",
            group_id,
            session.round_no.saturating_sub(1)
        );
        Ok(())
    }

    /// Every registered session, cloned
    pub async fn all_sessions(&self) -> Vec<SessionHandle> {
        self.sessions.read().await.values().cloned().collect()
    }

    /// Best-effort group message; failures are only logged
    pub async fn notify_group(&self, group_id: &GroupId, text: &str) {
        if let Err(e) = self.transport.send_group(group_id, text).await {
            tracing::warn!("Failed to send group message to {}: {}", group_id, e);
        }
    }

    /// Direct message whose failure the caller degrades itself
    pub async fn deliver_direct(&self, player_id: &PlayerId, text: &str) -> GameResult<MessageRef> {
        Ok(self.transport.send_direct(player_id, text).await?)
    }

    /// Best-effort direct message; failures are only logged
    pub async fn notify_player(&self, player_id: &PlayerId, text: &str) {
        if let Err(e) = self.deliver_direct(player_id, text).await {
            tracing::warn!("Failed to send direct message to {}: {}", player_id, e);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::prompts::PromptPool;
    use crate::protocol::OutboundAction;
    use crate::transport::{MemoryTransport, TransportResult};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    pub fn fast_config() -> GameConfig {
        GameConfig {
            response_timeout: Duration::from_secs(30),
            last_reminder_lead: Duration::from_secs(10),
            poll_timeout: Duration::from_secs(10),
            poll_check_interval: Duration::from_secs(1),
            ..GameConfig::default()
        }
    }

    pub fn test_state(
        prompts: Vec<&str>,
    ) -> (
        AppState,
        Arc<MemoryTransport>,
        mpsc::UnboundedReceiver<OutboundAction>,
    ) {
        let (transport, feed) = MemoryTransport::new();
        let transport = Arc::new(transport);
        let pool = PromptPool::new(prompts.into_iter().map(String::from).collect());
        let state = AppState::new(fast_config(), transport.clone(), Arc::new(pool));
        (state, transport, feed)
    }

    /// Memory transport where every direct message and poll takes `delay`.
    ///
    /// Polls are recorded before the delay, like a bridge that forwards the
    /// action first and confirms it later.
    pub struct SlowTransport {
        pub inner: MemoryTransport,
        delay: Duration,
        direct_started: RwLock<Vec<(Instant, PlayerId, String)>>,
    }

    impl SlowTransport {
        /// Direct messages whose send began after `at`, as `player: text`
        pub async fn directs_started_after(&self, at: Instant) -> Vec<String> {
            self.direct_started
                .read()
                .await
                .iter()
                .filter(|(started, _, _)| *started > at)
                .map(|(_, player, text)| format!("{}: {}", player, text))
                .collect()
        }
    }

    #[async_trait]
    impl ChatTransport for SlowTransport {
        async fn send_direct(&self, player_id: &PlayerId, text: &str) -> TransportResult<MessageRef> {
            self.direct_started
                .write()
                .await
                .push((Instant::now(), player_id.clone(), text.to_string()));
            tokio::time::sleep(self.delay).await;
            self.inner.send_direct(player_id, text).await
        }

        async fn send_group(&self, group_id: &GroupId, text: &str) -> TransportResult<()> {
            self.inner.send_group(group_id, text).await
        }

        async fn open_poll(
            &self,
            group_id: &GroupId,
            question: &str,
            options: [String; 2],
        ) -> TransportResult<PollRef> {
            let poll_ref = self.inner.open_poll(group_id, question, options).await?;
            tokio::time::sleep(self.delay).await;
            Ok(poll_ref)
        }
    }

    pub fn slow_state(
        prompts: Vec<&str>,
        delay: Duration,
    ) -> (
        AppState,
        Arc<SlowTransport>,
        mpsc::UnboundedReceiver<OutboundAction>,
    ) {
        let (inner, feed) = MemoryTransport::new();
        let transport = Arc::new(SlowTransport {
            inner,
            delay,
            direct_started: RwLock::new(Vec::new()),
        });
        let pool = PromptPool::new(prompts.into_iter().map(String::from).collect());
        let state = AppState::new(fast_config(), transport.clone(), Arc::new(pool));
        (state, transport, feed)
    }
}
