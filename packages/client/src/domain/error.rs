//! Domain layer error definitions.

use thiserror::Error;

use super::value_object::GameId;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// GameId validation error
    #[error("GameId cannot be empty")]
    GameIdEmpty,

    /// GameId too long error
    #[error("GameId cannot exceed {max} characters (got {actual})")]
    GameIdTooLong { max: usize, actual: usize },

    /// ConnectionId validation error
    #[error("ConnectionId cannot be empty")]
    ConnectionIdEmpty,

    /// Board dimensions outside the supported range
    #[error("Board dimensions must be between 1x1 and {max}x{max} (got {ranks}x{files})")]
    InvalidBoardDimensions { ranks: u8, files: u8, max: u8 },
}

/// Errors raised by game history repositories
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No history is stored for the game
    #[error("Game history not found: {0}")]
    GameNotFound(GameId),

    /// A history already exists for the game
    #[error("Game history already exists: {0}")]
    GameAlreadyExists(GameId),
}
