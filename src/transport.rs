mod bridge;
mod memory;

use crate::types::{GroupId, MessageRef, PlayerId, PollRef};
use async_trait::async_trait;

pub use bridge::BridgeTransport;
pub use memory::MemoryTransport;

pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur while talking to the chat platform
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Player {0} has not opened a private chat")]
    Unreachable(PlayerId),

    #[error("No chat bridge connected")]
    Disconnected,

    #[error("Platform rejected request: {0}")]
    Rejected(String),
}

/// Outbound capabilities of the chat platform.
///
/// The engine never inspects platform-specific fields; it only keeps the
/// opaque refs handed back here to correlate later replies and votes.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Deliver a private message to one player
    async fn send_direct(&self, player_id: &PlayerId, text: &str) -> TransportResult<MessageRef>;

    /// Deliver a message to the group chat
    async fn send_group(&self, group_id: &GroupId, text: &str) -> TransportResult<()>;

    /// Open a two-option poll in the group chat
    async fn open_poll(
        &self,
        group_id: &GroupId,
        question: &str,
        options: [String; 2],
    ) -> TransportResult<PollRef>;
}
