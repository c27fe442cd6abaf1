use crate::transport::TransportError;

pub type GameResult<T> = Result<T, GameError>;

/// Errors surfaced by session, round and vote operations.
///
/// The `Display` text is what the triggering actor gets to see.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Capacity(String),

    #[error("{0}")]
    Precondition(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

impl GameError {
    /// Short machine-readable code for the bridge protocol
    pub fn code(&self) -> &'static str {
        match self {
            GameError::Conflict(_) => "CONFLICT",
            GameError::NotFound(_) => "NOT_FOUND",
            GameError::Capacity(_) => "CAPACITY",
            GameError::Precondition(_) => "PRECONDITION",
            GameError::Delivery(_) => "DELIVERY",
        }
    }
}

impl From<TransportError> for GameError {
    fn from(e: TransportError) -> Self {
        GameError::Delivery(e.to_string())
    }
}
