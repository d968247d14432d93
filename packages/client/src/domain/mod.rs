//! Domain layer for the synchronization core.
//!
//! This module contains the game model held by the client and is
//! independent of wire DTOs and transport concerns.

pub mod action;
pub mod entity;
pub mod error;
pub mod message;
pub mod repository;
pub mod update;
pub mod value_object;

pub use action::{BoardSetup, PlayerAction, PlayerMove};
pub use entity::{
    Board, CapturedPieces, ClockTick, GameClock, GameEnding, GameHistory, GameMetadata,
    GameSnapshot, GameStatus, Piece, PlayerSlot, Players, SearchStatistics,
};
pub use error::{RepositoryError, ValueObjectError};
pub use message::{DisplayMessage, MessageBoard, MessageScope};
pub use repository::GameHistoryRepository;
pub use update::{GameRecord, ServerNotice, ServerUpdate};
pub use value_object::{
    BoardDimensions, Color, ConnectionId, GameId, PieceType, Position, Severity,
};
