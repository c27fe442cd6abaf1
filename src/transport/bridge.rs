use super::*;
use crate::protocol::OutboundAction;
use std::collections::HashSet;
use tokio::sync::{broadcast, RwLock};

/// Transport that forwards actions to connected chat-platform bridges.
///
/// Refs are generated here and handed to the bridge with the action, so the
/// bridge maps them to platform ids. Direct messages only go to players the
/// bridge reported as reachable.
pub struct BridgeTransport {
    outbound: broadcast::Sender<OutboundAction>,
    reachable: RwLock<HashSet<PlayerId>>,
}

impl BridgeTransport {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Self {
            outbound: tx,
            reachable: RwLock::new(HashSet::new()),
        }
    }

    /// Receive every action sent after this call
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundAction> {
        self.outbound.subscribe()
    }

    pub async fn mark_reachable(&self, player_id: &PlayerId) {
        tracing::debug!("Player {} opened a private chat", player_id);
        self.reachable.write().await.insert(player_id.clone());
    }

    fn forward(&self, action: OutboundAction) -> TransportResult<()> {
        self.outbound
            .send(action)
            .map(|_| ())
            .map_err(|_| TransportError::Disconnected)
    }
}

impl Default for BridgeTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for BridgeTransport {
    async fn send_direct(&self, player_id: &PlayerId, text: &str) -> TransportResult<MessageRef> {
        if !self.reachable.read().await.contains(player_id) {
            return Err(TransportError::Unreachable(player_id.clone()));
        }

        let message_ref = ulid::Ulid::new().to_string();
        self.forward(OutboundAction::SendDirect {
            message_ref: message_ref.clone(),
            player_id: player_id.clone(),
            text: text.to_string(),
        })?;
        Ok(message_ref)
    }

    async fn send_group(&self, group_id: &GroupId, text: &str) -> TransportResult<()> {
        self.forward(OutboundAction::SendGroup {
            group_id: group_id.clone(),
            text: text.to_string(),
        })
    }

    async fn open_poll(
        &self,
        group_id: &GroupId,
        question: &str,
        options: [String; 2],
    ) -> TransportResult<PollRef> {
        let poll_ref = ulid::Ulid::new().to_string();
        self.forward(OutboundAction::OpenPoll {
            poll_ref: poll_ref.clone(),
            group_id: group_id.clone(),
            question: question.to_string(),
            options,
        })?;
        Ok(poll_ref)
    }
}
