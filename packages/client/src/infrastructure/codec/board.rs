//! Board codec.
//!
//! Squares are transmitted rank by rank starting at rank 0; square `idx` sits
//! at rank `idx / files`, file `idx % files`. Rank 0 lands in the last row of
//! the expanded board.

use serde::{Deserialize, Serialize};

use super::{decode_piece, encode_piece};
use crate::domain::{Board, BoardDimensions, Position};

/// Square width of a compact board payload.
///
/// The current protocol packs two squares per byte. The legacy one-byte form
/// is only used when a payload is explicitly tagged with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SquareEncoding {
    #[default]
    Nibble,
    Byte,
}

impl SquareEncoding {
    /// Code denoting an empty square.
    pub fn sentinel(self) -> u8 {
        match self {
            SquareEncoding::Nibble => 0xF,
            SquareEncoding::Byte => 0xFF,
        }
    }

    /// Square code at transmitted index `idx`, if the payload is long enough.
    fn code_at(self, bytes: &[u8], idx: usize) -> Option<u8> {
        match self {
            SquareEncoding::Byte => bytes.get(idx).copied(),
            SquareEncoding::Nibble => {
                let byte = bytes.get(idx / 2)?;
                Some(if idx % 2 == 0 { byte >> 4 } else { byte & 0x0F })
            }
        }
    }
}

/// Expand a compact board.
///
/// # Arguments
///
/// * `bytes` - Raw square codes (already base64-decoded)
/// * `dimensions` - Declared rank/file counts
/// * `encoding` - Square width of `bytes`
/// * `last_moves` - Per transmitted square, the move index at which its occupant last moved
///
/// Missing squares stay empty and surplus bytes are ignored.
pub fn decode_board(
    bytes: &[u8],
    dimensions: BoardDimensions,
    encoding: SquareEncoding,
    last_moves: &[Option<u32>],
) -> Board {
    let mut board = Board::empty(dimensions);
    let files = dimensions.files as usize;

    for idx in 0..dimensions.square_count() {
        let Some(code) = encoding.code_at(bytes, idx) else {
            break;
        };
        if let Some(mut piece) = decode_piece(code) {
            piece.last_moved_at = last_moves.get(idx).copied().flatten();
            let position = Position::new((idx / files) as u8, (idx % files) as u8);
            board.set(position, Some(piece));
        }
    }

    board
}

/// Pack a board back into its compact form.
///
/// Nibble output puts the even-indexed square in the high nibble and pads an
/// odd trailing square with the sentinel.
pub fn encode_board(board: &Board, encoding: SquareEncoding) -> Vec<u8> {
    let dimensions = board.dimensions();
    let files = dimensions.files as usize;
    let codes = (0..dimensions.square_count()).map(|idx| {
        let position = Position::new((idx / files) as u8, (idx % files) as u8);
        board
            .get(position)
            .map(encode_piece)
            .unwrap_or(encoding.sentinel())
    });

    match encoding {
        SquareEncoding::Byte => codes.collect(),
        SquareEncoding::Nibble => {
            let codes: Vec<u8> = codes.collect();
            codes
                .chunks(2)
                .map(|pair| {
                    let high = pair[0];
                    let low = pair.get(1).copied().unwrap_or(SquareEncoding::Nibble.sentinel());
                    (high << 4) | low
                })
                .collect()
        }
    }
}
