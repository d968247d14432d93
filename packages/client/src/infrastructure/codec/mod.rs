//! Compact state codec.
//!
//! Pure functions converting the dense wire encoding of boards and captured
//! pieces into domain structures. Decoding never fails: unknown codes become
//! empty squares and short input yields a partial board.

mod board;
mod captured;

pub use board::{SquareEncoding, decode_board, encode_board};
pub use captured::{decode_captured_pieces, encode_captured_pieces};

use crate::domain::{Color, Piece, PieceType};

/// Number of distinct piece codes per color.
const CODES_PER_COLOR: u8 = 6;

/// Decode one piece code.
///
/// `code >= 6` is black, `code % 6` indexes [`PieceType::ALL`]. Codes past
/// the last black piece (including every sentinel) are empty.
pub fn decode_piece(code: u8) -> Option<Piece> {
    if code >= CODES_PER_COLOR * 2 {
        return None;
    }
    let color = if code >= CODES_PER_COLOR {
        Color::Black
    } else {
        Color::White
    };
    let piece_type = PieceType::ALL[(code % CODES_PER_COLOR) as usize];
    Some(Piece::new(piece_type, color))
}

/// Inverse of [`decode_piece`].
pub fn encode_piece(piece: &Piece) -> u8 {
    let offset = match piece.color {
        Color::White => 0,
        Color::Black => CODES_PER_COLOR,
    };
    offset + piece.piece_type.index()
}
