//! Game record DTOs and their conversion to domain models.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{
        BoardDimensions, Color, ConnectionId, GameClock, GameId, GameMetadata, GameRecord,
        GameSnapshot, GameStatus, PlayerSlot, Players, SearchStatistics, ValueObjectError,
    },
    infrastructure::codec::{SquareEncoding, decode_board, decode_captured_pieces},
};

/// Errors raised while turning a game record DTO into domain models.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid game record: {0}")]
    ValueObject(#[from] ValueObjectError),
}

/// Declared board size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionsDto {
    pub ranks: u8,
    pub files: u8,
}

/// Compact board payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactBoardDto {
    /// Base64 of the packed square codes.
    pub squares: String,
    pub dimensions: DimensionsDto,
    #[serde(default)]
    pub last_moves: Vec<Option<u32>>,
    #[serde(default)]
    pub encoding: SquareEncoding,
}

/// Compact captured pieces: base64 byte lists plus point totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompactCapturedPiecesDto {
    pub white: String,
    pub black: String,
    pub white_points: u32,
    pub black_points: u32,
}

/// Countdown clock state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTimeDto {
    pub white_seconds_left: u64,
    pub black_seconds_left: u64,
    #[serde(default)]
    pub last_move_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub both_players_last_connected_at: Option<DateTime<Utc>>,
}

/// Tip snapshot fields, flattened into the game record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDto {
    pub state: GameStatus,
    pub current_turn: Color,
    #[serde(default)]
    pub in_check: Option<Color>,
    pub board: CompactBoardDto,
    #[serde(default)]
    pub captured_pieces: CompactCapturedPiecesDto,
    #[serde(default)]
    pub engine_result: Option<SearchStatistics>,
}

/// A game record as pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecordDto {
    #[serde(alias = "game_id")]
    pub game_id: String,
    #[serde(default)]
    pub white_username: Option<String>,
    #[serde(default)]
    pub white_connection_id: Option<String>,
    #[serde(default)]
    pub black_username: Option<String>,
    #[serde(default)]
    pub black_connection_id: Option<String>,
    #[serde(default)]
    pub game_time: Option<GameTimeDto>,
    #[serde(flatten)]
    pub snapshot: SnapshotDto,
}

impl GameRecordDto {
    /// Convert into domain models, decoding the compact board and captures.
    pub fn into_domain(self) -> Result<GameRecord, DecodeError> {
        let id = GameId::new(self.game_id)?;
        let players = Players {
            white: player_slot(self.white_username, self.white_connection_id),
            black: player_slot(self.black_username, self.black_connection_id),
        };
        let clock = self.game_time.map(|time| GameClock {
            white_seconds_left: time.white_seconds_left,
            black_seconds_left: time.black_seconds_left,
            last_move_at: time.last_move_at,
            both_players_last_connected_at: time.both_players_last_connected_at,
        });

        Ok(GameRecord {
            id,
            metadata: GameMetadata { players, clock },
            snapshot: self.snapshot.into_domain()?,
        })
    }
}

impl SnapshotDto {
    pub fn into_domain(self) -> Result<GameSnapshot, DecodeError> {
        let dimensions =
            BoardDimensions::new(self.board.dimensions.ranks, self.board.dimensions.files)?;
        let board = decode_board(
            &decode_base64(&self.board.squares),
            dimensions,
            self.board.encoding,
            &self.board.last_moves,
        );
        let captured_pieces = decode_captured_pieces(
            &decode_base64(&self.captured_pieces.white),
            &decode_base64(&self.captured_pieces.black),
            self.captured_pieces.white_points,
            self.captured_pieces.black_points,
        );

        Ok(GameSnapshot {
            status: self.state,
            current_turn: self.current_turn,
            in_check: self.in_check,
            board,
            captured_pieces,
            search_statistics: self.engine_result,
        })
    }
}

fn player_slot(username: Option<String>, connection_id: Option<String>) -> PlayerSlot {
    PlayerSlot {
        username: username.filter(|name| !name.is_empty()),
        connection_id: connection_id.and_then(|id| ConnectionId::new(id).ok()),
    }
}

/// Base64 decode that degrades to no bytes (an all-empty board) on bad input.
fn decode_base64(text: &str) -> Vec<u8> {
    STANDARD.decode(text).unwrap_or_else(|e| {
        tracing::warn!("Invalid base64 in compact payload: {}", e);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GameEnding, Piece, PieceType, Position};
    use serde_json::json;

    /// 8x8 nibble board with the white king on e1 and the black king on e8.
    fn kings_only_squares() -> String {
        let mut bytes = vec![0xFFu8; 32];
        // square 4 (rank 0, file 4): high nibble of byte 2
        bytes[2] = 0x5F;
        // square 60 (rank 7, file 4): high nibble of byte 30
        bytes[30] = 0xBF;
        STANDARD.encode(bytes)
    }

    fn record_json() -> serde_json::Value {
        json!({
            "gameId": "g1",
            "whiteUsername": "alice",
            "whiteConnectionId": "conn-a",
            "blackUsername": "bob",
            "blackConnectionId": null,
            "gameTime": {
                "whiteSecondsLeft": 300,
                "blackSecondsLeft": 280,
                "lastMoveAt": "2025-01-01T12:00:00Z"
            },
            "state": "in-progress",
            "currentTurn": "black",
            "inCheck": "black",
            "board": {
                "squares": kings_only_squares(),
                "dimensions": {"ranks": 8, "files": 8}
            },
            "capturedPieces": {
                "white": STANDARD.encode([6u8, 7]),
                "black": "",
                "whitePoints": 4,
                "blackPoints": 0
            },
            "engineResult": {
                "depth": 6, "nodes": 1200, "qnodes": 300, "timeMs": 45, "fromBook": false
            }
        })
    }

    #[test]
    fn test_record_into_domain() {
        // テスト項目: ゲームレコードをドメインモデルに変換できる
        // given (前提条件):
        let dto: GameRecordDto = serde_json::from_value(record_json()).unwrap();

        // when (操作):
        let record = dto.into_domain().unwrap();

        // then (期待する結果):
        assert_eq!(record.id.as_str(), "g1");
        assert_eq!(record.snapshot.status, GameStatus::InProgress);
        assert_eq!(record.snapshot.current_turn, Color::Black);
        assert_eq!(record.snapshot.in_check, Some(Color::Black));
        assert_eq!(
            record.snapshot.board.get(Position::new(0, 4)),
            Some(&Piece::new(PieceType::King, Color::White))
        );
        assert_eq!(
            record.snapshot.board.get(Position::new(7, 4)),
            Some(&Piece::new(PieceType::King, Color::Black))
        );
        assert_eq!(record.snapshot.board.pieces().count(), 2);
        assert_eq!(record.snapshot.captured_pieces.white.len(), 2);
        assert_eq!(record.snapshot.captured_pieces.white_points, 4);
        assert_eq!(record.snapshot.search_statistics.unwrap().nodes, 1200);
        assert!(record.metadata.players.white.is_connected());
        assert!(!record.metadata.players.black.is_connected());
        assert_eq!(record.metadata.clock.unwrap().black_seconds_left, 280);
    }

    #[test]
    fn test_finished_state_tags() {
        // テスト項目: 終局状態のタグ付きバリアントを解析できる
        let mut value = record_json();
        value["state"] = json!({"finished": {"checkmate": "white"}});
        let dto: GameRecordDto = serde_json::from_value(value).unwrap();
        assert_eq!(
            dto.snapshot.state,
            GameStatus::Finished(GameEnding::Checkmate(Color::White))
        );

        let mut value = record_json();
        value["state"] = json!({"finished": "draw-by-fifty-move-rule"});
        let dto: GameRecordDto = serde_json::from_value(value).unwrap();
        assert_eq!(
            dto.snapshot.state,
            GameStatus::Finished(GameEnding::DrawByFiftyMoveRule)
        );
    }

    #[test]
    fn test_invalid_base64_yields_empty_board() {
        // テスト項目: 不正な base64 は空の盤面として扱われる
        // given (前提条件):
        let mut value = record_json();
        value["board"]["squares"] = json!("%%% not base64 %%%");

        // when (操作):
        let record = serde_json::from_value::<GameRecordDto>(value)
            .unwrap()
            .into_domain()
            .unwrap();

        // then (期待する結果):
        assert_eq!(record.snapshot.board.pieces().count(), 0);
    }

    #[test]
    fn test_oversized_dimensions_are_rejected() {
        // テスト項目: 上限を超える盤サイズはエラーになる
        let mut value = record_json();
        value["board"]["dimensions"] = json!({"ranks": 13, "files": 8});
        let result = serde_json::from_value::<GameRecordDto>(value)
            .unwrap()
            .into_domain();
        assert!(matches!(result, Err(DecodeError::ValueObject(_))));
    }

    #[test]
    fn test_legacy_byte_encoding_when_tagged() {
        // テスト項目: encoding が byte の場合は 1 マス 1 バイトとして解釈する
        // given (前提条件):
        let mut squares = vec![0xFFu8; 64];
        squares[0] = 3;
        let mut value = record_json();
        value["board"]["squares"] = json!(STANDARD.encode(squares));
        value["board"]["encoding"] = json!("byte");

        // when (操作):
        let record = serde_json::from_value::<GameRecordDto>(value)
            .unwrap()
            .into_domain()
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            record.snapshot.board.get(Position::new(0, 0)),
            Some(&Piece::new(PieceType::Rook, Color::White))
        );
        assert_eq!(record.snapshot.board.pieces().count(), 1);
    }

    #[test]
    fn test_snake_case_game_id_alias() {
        // テスト項目: game_id 形式のキーも受け付ける
        let mut value = record_json();
        let object = value.as_object_mut().unwrap();
        let id = object.remove("gameId").unwrap();
        object.insert("game_id".to_string(), id);
        let dto: GameRecordDto = serde_json::from_value(value).unwrap();
        assert_eq!(dto.game_id, "g1");
    }
}
