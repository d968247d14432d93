//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ValueObjectError;

/// Maximum accepted length of a game identifier.
pub const MAX_GAME_ID_LENGTH: usize = 100;

/// Largest supported rank or file count.
pub const MAX_BOARD_SIDE: u8 = 12;

/// Game identifier value object.
///
/// Assigned by the server (or chosen by the creating player) and used to key
/// every per-game history held by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId(String);

impl GameId {
    /// Create a new GameId.
    ///
    /// # Arguments
    ///
    /// * `id` - The game identifier string
    ///
    /// # Returns
    ///
    /// A Result containing the GameId or an error if validation fails
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.trim().is_empty() {
            return Err(ValueObjectError::GameIdEmpty);
        }
        let len = id.len();
        if len > MAX_GAME_ID_LENGTH {
            return Err(ValueObjectError::GameIdTooLong {
                max: MAX_GAME_ID_LENGTH,
                actual: len,
            });
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for GameId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Connection identity token handed out by the server on the first message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Create a new ConnectionId.
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::ConnectionIdEmpty);
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// Piece kinds, in wire code order (`code % 6` indexes into this list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// All piece types in wire code order.
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// Index of this piece type within the wire code ordering.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Single-letter notation, upper case.
    pub fn letter(self) -> char {
        match self {
            PieceType::Pawn => 'P',
            PieceType::Knight => 'N',
            PieceType::Bishop => 'B',
            PieceType::Rook => 'R',
            PieceType::Queen => 'Q',
            PieceType::King => 'K',
        }
    }
}

/// Square coordinate, 0-indexed. Rank 0 is the first transmitted rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub rank: u8,
    pub file: u8,
}

impl Position {
    pub fn new(rank: u8, file: u8) -> Self {
        Self { rank, file }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Files as letters, ranks 1-based: (0, 0) is "a1".
        let file = (b'a' + self.file) as char;
        write!(f, "{}{}", file, self.rank + 1)
    }
}

impl std::str::FromStr for Position {
    type Err = String;

    /// Parse algebraic-style coordinates such as `e2` or `l12`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let mut chars = s.chars();
        let file = chars
            .next()
            .filter(|c| c.is_ascii_lowercase())
            .ok_or_else(|| format!("'{s}' is not a valid square"))?;
        let rank: u8 = chars
            .as_str()
            .parse()
            .map_err(|_| format!("'{s}' is not a valid square"))?;
        if rank == 0 || file as u8 - b'a' >= MAX_BOARD_SIDE || rank > MAX_BOARD_SIDE {
            return Err(format!("'{s}' is outside the board"));
        }
        Ok(Position {
            rank: rank - 1,
            file: file as u8 - b'a',
        })
    }
}

/// Declared rank/file counts of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardDimensions {
    pub ranks: u8,
    pub files: u8,
}

impl BoardDimensions {
    /// Create validated dimensions.
    pub fn new(ranks: u8, files: u8) -> Result<Self, ValueObjectError> {
        if ranks == 0 || files == 0 || ranks > MAX_BOARD_SIDE || files > MAX_BOARD_SIDE {
            return Err(ValueObjectError::InvalidBoardDimensions {
                ranks,
                files,
                max: MAX_BOARD_SIDE,
            });
        }
        Ok(Self { ranks, files })
    }

    /// Total number of squares.
    pub fn square_count(&self) -> usize {
        self.ranks as usize * self.files as usize
    }
}

/// Severity tag attached to a server display message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Success,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_id_new_success() {
        // テスト項目: 有効なゲーム ID を作成できる
        // given (前提条件):
        let id = "g1".to_string();

        // when (操作):
        let result = GameId::new(id);

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(result.unwrap().as_str(), "g1");
    }

    #[test]
    fn test_game_id_new_empty_fails() {
        // テスト項目: 空のゲーム ID は作成できない
        // when (操作):
        let result = GameId::new("  ".to_string());

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), ValueObjectError::GameIdEmpty);
    }

    #[test]
    fn test_game_id_new_too_long_fails() {
        // テスト項目: 101 文字以上のゲーム ID は作成できない
        // when (操作):
        let result = GameId::new("a".repeat(101));

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ValueObjectError::GameIdTooLong {
                max: 100,
                actual: 101
            }
        );
    }

    #[test]
    fn test_connection_id_empty_fails() {
        // テスト項目: 空の接続 ID は作成できない
        assert_eq!(
            ConnectionId::new(String::new()).unwrap_err(),
            ValueObjectError::ConnectionIdEmpty
        );
    }

    #[test]
    fn test_board_dimensions_range() {
        // テスト項目: 盤面サイズは 1..=12 の範囲のみ受け付ける
        assert!(BoardDimensions::new(8, 8).is_ok());
        assert!(BoardDimensions::new(12, 6).is_ok());
        assert!(BoardDimensions::new(0, 8).is_err());
        assert!(BoardDimensions::new(8, 13).is_err());
        assert_eq!(BoardDimensions::new(7, 9).unwrap().square_count(), 63);
    }

    #[test]
    fn test_position_parse_and_display() {
        // テスト項目: 座標文字列をパースし、同じ表記で表示できる
        // when (操作):
        let position: Position = "e2".parse().unwrap();

        // then (期待する結果):
        assert_eq!(position, Position::new(1, 4));
        assert_eq!(position.to_string(), "e2");
        assert_eq!("l12".parse::<Position>().unwrap(), Position::new(11, 11));
    }

    #[test]
    fn test_position_parse_rejects_garbage() {
        // テスト項目: 不正な座標文字列はエラーになる
        assert!("".parse::<Position>().is_err());
        assert!("e0".parse::<Position>().is_err());
        assert!("z1".parse::<Position>().is_err());
        assert!("e13".parse::<Position>().is_err());
        assert!("9e".parse::<Position>().is_err());
    }

    #[test]
    fn test_color_serde_kebab_case() {
        // テスト項目: 色は小文字の文字列としてシリアライズされる
        assert_eq!(serde_json::to_string(&Color::White).unwrap(), "\"white\"");
        assert_eq!(
            serde_json::from_str::<Color>("\"black\"").unwrap(),
            Color::Black
        );
        assert_eq!(Color::White.opponent(), Color::Black);
    }
}
