//! Game Errors
//!
//! Failures surfaced by the registry and coordinator.

use thiserror::Error;

/// Longest accepted player name, in characters.
pub const MAX_NAME_CHARS: usize = 32;

/// Errors returned by coordinator operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Name is empty or longer than [`MAX_NAME_CHARS`].
    #[error("name must be 1 to {} characters", MAX_NAME_CHARS)]
    InvalidName,

    /// Name already belongs to a registered player.
    #[error("name already taken: {0}")]
    NameTaken(String),

    /// Move requested for a name that was never registered.
    #[error("unknown player: {0}")]
    UnknownPlayer(String),

    /// Backing store could not be reached.
    ///
    /// Only produced by networked stores; the whole operation may be retried.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl GameError {
    /// Whether the caller may simply retry the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GameError::StorageUnavailable(_))
    }

    /// Whether this is a registration rejection the session may retry with another name.
    pub fn is_name_rejection(&self) -> bool {
        matches!(self, GameError::InvalidName | GameError::NameTaken(_))
    }
}
