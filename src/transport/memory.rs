use super::*;
use crate::protocol::OutboundAction;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, RwLock};

/// Transport that records every outbound action instead of delivering it.
///
/// Refs are sequential (`m1`, `m2`, ... and `poll1`, ...). Each recorded
/// action is also pushed to an unbounded feed so callers can wait for the
/// engine to reach a given point.
pub struct MemoryTransport {
    sent: RwLock<Vec<OutboundAction>>,
    unreachable: RwLock<HashSet<PlayerId>>,
    feed: mpsc::UnboundedSender<OutboundAction>,
    next_ref: AtomicU64,
}

impl MemoryTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundAction>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Self {
            sent: RwLock::new(Vec::new()),
            unreachable: RwLock::new(HashSet::new()),
            feed: tx,
            next_ref: AtomicU64::new(1),
        };
        (transport, rx)
    }

    /// Make direct messages to `player_id` fail
    pub async fn set_unreachable(&self, player_id: &str) {
        self.unreachable.write().await.insert(player_id.to_string());
    }

    /// Everything recorded so far
    pub async fn sent(&self) -> Vec<OutboundAction> {
        self.sent.read().await.clone()
    }

    /// Texts of direct messages delivered to one player
    pub async fn direct_texts(&self, player_id: &str) -> Vec<String> {
        self.sent
            .read()
            .await
            .iter()
            .filter_map(|a| match a {
                OutboundAction::SendDirect {
                    player_id: p, text, ..
                } if p == player_id => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Texts of group messages
    pub async fn group_texts(&self) -> Vec<String> {
        self.sent
            .read()
            .await
            .iter()
            .filter_map(|a| match a {
                OutboundAction::SendGroup { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn next(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next_ref.fetch_add(1, Ordering::Relaxed))
    }

    async fn record(&self, action: OutboundAction) {
        self.sent.write().await.push(action.clone());
        // Nobody listening is fine
        let _ = self.feed.send(action);
    }
}

#[async_trait]
impl ChatTransport for MemoryTransport {
    async fn send_direct(&self, player_id: &PlayerId, text: &str) -> TransportResult<MessageRef> {
        if self.unreachable.read().await.contains(player_id) {
            return Err(TransportError::Unreachable(player_id.clone()));
        }

        let message_ref = self.next("m");
        self.record(OutboundAction::SendDirect {
            message_ref: message_ref.clone(),
            player_id: player_id.clone(),
            text: text.to_string(),
        })
        .await;
        Ok(message_ref)
    }

    async fn send_group(&self, group_id: &GroupId, text: &str) -> TransportResult<()> {
        self.record(OutboundAction::SendGroup {
            group_id: group_id.clone(),
            text: text.to_string(),
        })
        .await;
        Ok(())
    }

    async fn open_poll(
        &self,
        group_id: &GroupId,
        question: &str,
        options: [String; 2],
    ) -> TransportResult<PollRef> {
        let poll_ref = self.next("poll");
        self.record(OutboundAction::OpenPoll {
            poll_ref: poll_ref.clone(),
            group_id: group_id.clone(),
            question: question.to_string(),
            options,
        })
        .await;
        Ok(poll_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_and_feeds_actions() {
        let (transport, mut feed) = MemoryTransport::new();

        let message_ref = transport
            .send_direct(&"u1".to_string(), "hello")
            .await
            .unwrap();
        transport.send_group(&"g1".to_string(), "hi all").await.unwrap();

        assert_eq!(message_ref, "m1");
        assert_eq!(transport.direct_texts("u1").await, vec!["hello"]);
        assert_eq!(transport.group_texts().await, vec!["hi all"]);
        assert!(matches!(
            feed.recv().await,
            Some(OutboundAction::SendDirect { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_player_fails() {
        let (transport, _feed) = MemoryTransport::new();
        transport.set_unreachable("u2").await;

        let result = transport.send_direct(&"u2".to_string(), "hello").await;
        assert!(matches!(result, Err(TransportError::Unreachable(_))));
        assert!(transport.sent().await.is_empty());
    }
}
