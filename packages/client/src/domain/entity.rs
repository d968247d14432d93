//! Core domain models for the synchronization core.
//!
//! Snapshots are immutable once built; histories only ever grow.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_object::{BoardDimensions, Color, ConnectionId, GameId, PieceType, Position};

/// A piece standing on a square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub piece_type: PieceType,
    pub color: Color,
    /// Move index at which this piece last moved, if it ever did.
    pub last_moved_at: Option<u32>,
}

impl Piece {
    pub fn new(piece_type: PieceType, color: Color) -> Self {
        Self {
            piece_type,
            color,
            last_moved_at: None,
        }
    }

    /// Same kind and color, ignoring move metadata.
    pub fn same_kind(&self, other: &Piece) -> bool {
        self.piece_type == other.piece_type && self.color == other.color
    }

    /// Letter notation: upper case for white, lower case for black.
    pub fn symbol(&self) -> char {
        match self.color {
            Color::White => self.piece_type.letter(),
            Color::Black => self.piece_type.letter().to_ascii_lowercase(),
        }
    }
}

/// Expanded board, rank-major. Row 0 holds the highest rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    dimensions: BoardDimensions,
    squares: Vec<Vec<Option<Piece>>>,
}

impl Board {
    /// Create an empty board.
    pub fn empty(dimensions: BoardDimensions) -> Self {
        Self {
            dimensions,
            squares: vec![vec![None; dimensions.files as usize]; dimensions.ranks as usize],
        }
    }

    pub fn dimensions(&self) -> BoardDimensions {
        self.dimensions
    }

    /// Rows in display order (highest rank first).
    pub fn rows(&self) -> &[Vec<Option<Piece>>] {
        &self.squares
    }

    fn row_index(&self, rank: u8) -> Option<usize> {
        (rank < self.dimensions.ranks).then(|| (self.dimensions.ranks - 1 - rank) as usize)
    }

    /// Piece at a 0-indexed rank/file position.
    pub fn get(&self, position: Position) -> Option<&Piece> {
        let row = self.row_index(position.rank)?;
        self.squares
            .get(row)?
            .get(position.file as usize)?
            .as_ref()
    }

    /// Place (or clear) a square. Out-of-range positions are ignored.
    pub fn set(&mut self, position: Position, piece: Option<Piece>) {
        if let Some(row) = self.row_index(position.rank)
            && let Some(square) = self
                .squares
                .get_mut(row)
                .and_then(|r| r.get_mut(position.file as usize))
        {
            *square = piece;
        }
    }

    /// Number of pieces of the given type, both colors.
    pub fn count(&self, piece_type: PieceType) -> usize {
        self.pieces()
            .filter(|(_, piece)| piece.piece_type == piece_type)
            .count()
    }

    /// Iterate occupied squares with their positions.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, &Piece)> + '_ {
        let ranks = self.dimensions.ranks;
        self.squares.iter().enumerate().flat_map(move |(row, squares)| {
            squares.iter().enumerate().filter_map(move |(file, square)| {
                square
                    .as_ref()
                    .map(|piece| (Position::new(ranks - 1 - row as u8, file as u8), piece))
            })
        })
    }

    /// True when every square holds the same kind of piece (or nothing) on both boards.
    pub fn same_placement(&self, other: &Board) -> bool {
        self.dimensions == other.dimensions
            && self.squares.iter().zip(&other.squares).all(|(a, b)| {
                a.iter().zip(b).all(|(x, y)| match (x, y) {
                    (None, None) => true,
                    (Some(x), Some(y)) => x.same_kind(y),
                    _ => false,
                })
            })
    }
}

/// Captured pieces for both colors with running point totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedPieces {
    pub white: Vec<Piece>,
    pub black: Vec<Piece>,
    pub white_points: u32,
    pub black_points: u32,
}

impl CapturedPieces {
    /// Total captured pieces, either color.
    pub fn total(&self) -> usize {
        self.white.len() + self.black.len()
    }
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameEnding {
    Checkmate(Color),
    Resignation(Color),
    OutOfTime(Color),
    Stalemate,
    DrawByThreefoldRepetition,
    DrawByFiftyMoveRule,
    DrawByInsufficientMaterial,
    DrawByMutualAgreement,
}

/// Game state tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameStatus {
    NotStarted,
    InProgress,
    Finished(GameEnding),
}

/// Statistics reported by the server-side move search, when an engine moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStatistics {
    pub depth: u8,
    pub nodes: u64,
    pub qnodes: u64,
    pub time_ms: u64,
    pub from_book: bool,
}

/// Authoritative state of one game at one point in its history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub status: GameStatus,
    pub current_turn: Color,
    pub in_check: Option<Color>,
    pub board: Board,
    pub captured_pieces: CapturedPieces,
    pub search_statistics: Option<SearchStatistics>,
}

/// One seat at the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerSlot {
    pub username: Option<String>,
    pub connection_id: Option<ConnectionId>,
}

impl PlayerSlot {
    pub fn is_connected(&self) -> bool {
        self.connection_id.is_some()
    }
}

/// Both seats of a game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Players {
    pub white: PlayerSlot,
    pub black: PlayerSlot,
}

impl Players {
    pub fn both_connected(&self) -> bool {
        self.white.is_connected() && self.black.is_connected()
    }

    /// Color seated by `username`; white wins when both seats share a name.
    pub fn color_of(&self, username: &str) -> Option<Color> {
        if self.white.username.as_deref() == Some(username) {
            Some(Color::White)
        } else if self.black.username.as_deref() == Some(username) {
            Some(Color::Black)
        } else {
            None
        }
    }
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// The clock is paused (game not running or a player is away).
    Paused,
    /// One second was taken from the side to move.
    Running { color: Color, seconds_left: u64 },
    /// The side to move just ran out of time on this tick.
    Expired(Color),
}

/// Countdown clock state for both colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameClock {
    pub white_seconds_left: u64,
    pub black_seconds_left: u64,
    pub last_move_at: Option<DateTime<Utc>>,
    pub both_players_last_connected_at: Option<DateTime<Utc>>,
}

impl GameClock {
    pub fn seconds_left(&self, color: Color) -> u64 {
        match color {
            Color::White => self.white_seconds_left,
            Color::Black => self.black_seconds_left,
        }
    }

    /// Take one second from `to_move`.
    pub fn tick(&mut self, to_move: Color) -> ClockTick {
        let seconds_left = match to_move {
            Color::White => &mut self.white_seconds_left,
            Color::Black => &mut self.black_seconds_left,
        };

        if *seconds_left == 0 {
            return ClockTick::Paused;
        }

        *seconds_left -= 1;

        if *seconds_left == 0 {
            ClockTick::Expired(to_move)
        } else {
            ClockTick::Running {
                color: to_move,
                seconds_left: *seconds_left,
            }
        }
    }
}

/// Record-level metadata that travels with every snapshot push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameMetadata {
    pub players: Players,
    pub clock: Option<GameClock>,
}

/// Append-only history of snapshots for one game.
#[derive(Debug, Clone)]
pub struct GameHistory {
    id: GameId,
    snapshots: Vec<Arc<GameSnapshot>>,
    metadata: GameMetadata,
}

impl GameHistory {
    /// Create a history seeded with its first snapshot.
    pub fn new(id: GameId, metadata: GameMetadata, first: Arc<GameSnapshot>) -> Self {
        Self {
            id,
            snapshots: vec![first],
            metadata,
        }
    }

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn snapshots(&self) -> &[Arc<GameSnapshot>] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Most recent snapshot. A history always holds at least its seed.
    pub fn latest(&self) -> &Arc<GameSnapshot> {
        &self.snapshots[self.snapshots.len() - 1]
    }

    pub fn get(&self, index: usize) -> Option<&Arc<GameSnapshot>> {
        self.snapshots.get(index)
    }

    pub fn metadata(&self) -> &GameMetadata {
        &self.metadata
    }

    pub fn players(&self) -> &Players {
        &self.metadata.players
    }

    pub fn clock(&self) -> Option<&GameClock> {
        self.metadata.clock.as_ref()
    }

    /// Append a new tip snapshot and take the record metadata that came with it.
    pub fn push(&mut self, snapshot: Arc<GameSnapshot>, metadata: GameMetadata) {
        self.snapshots.push(snapshot);
        self.metadata = metadata;
    }

    /// Replace record metadata without touching the stored snapshots.
    pub fn refresh(&mut self, metadata: GameMetadata) {
        self.metadata = metadata;
    }

    /// Advance the countdown by one second.
    ///
    /// Paused unless the tip is in progress and both players are connected.
    pub fn tick_clock(&mut self) -> ClockTick {
        let latest = Arc::clone(self.latest());
        let both_connected = self.metadata.players.both_connected();

        match &mut self.metadata.clock {
            Some(clock) if latest.status == GameStatus::InProgress && both_connected => {
                clock.tick(latest.current_turn)
            }
            _ => ClockTick::Paused,
        }
    }
}
