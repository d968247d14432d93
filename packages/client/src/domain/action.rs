//! Outbound client intents.
//!
//! Serialized as externally tagged kebab-case variants, e.g. `"heartbeat"` or
//! `{"join-game": {"username": "...", "gameId": "..."}}`.

use serde::{Deserialize, Serialize};

use super::value_object::{BoardDimensions, Color, GameId, Position};

/// Initial piece arrangement requested when creating a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoardSetup {
    Standard,
    Random(BoardDimensions),
    KingAndOneOtherPiece(BoardDimensions),
}

/// A move from one square to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMove {
    pub from: Position,
    pub to: Position,
}

/// Every intent the client can send to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerAction {
    #[serde(rename_all = "camelCase")]
    CreateGame {
        username: String,
        game_id: Option<GameId>,
        board_setup: Option<BoardSetup>,
        color_preference: Option<Color>,
    },
    #[serde(rename_all = "camelCase")]
    JoinGame { username: String, game_id: GameId },
    #[serde(rename_all = "camelCase")]
    LeaveGame { game_id: GameId },
    #[serde(rename_all = "camelCase")]
    GetGameState { game_id: GameId },
    #[serde(rename_all = "camelCase")]
    MovePiece {
        game_id: GameId,
        player_move: PlayerMove,
    },
    #[serde(rename_all = "camelCase")]
    Resign { game_id: GameId },
    #[serde(rename_all = "camelCase")]
    OfferDraw { game_id: GameId },
    Heartbeat,
    #[serde(rename_all = "camelCase")]
    LoseViaOutOfTime { game_id: GameId },
}

impl PlayerAction {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            PlayerAction::CreateGame { .. } => "create-game",
            PlayerAction::JoinGame { .. } => "join-game",
            PlayerAction::LeaveGame { .. } => "leave-game",
            PlayerAction::GetGameState { .. } => "get-game-state",
            PlayerAction::MovePiece { .. } => "move-piece",
            PlayerAction::Resign { .. } => "resign",
            PlayerAction::OfferDraw { .. } => "offer-draw",
            PlayerAction::Heartbeat => "heartbeat",
            PlayerAction::LoseViaOutOfTime { .. } => "lose-via-out-of-time",
        }
    }
}
