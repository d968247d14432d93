//! Captured-piece codec: one byte per captured piece, per color.

use super::{decode_piece, encode_piece};
use crate::domain::{CapturedPieces, Piece};

/// Expand both captured-piece lists. Sentinel and unknown bytes are skipped;
/// point totals pass through unchanged.
pub fn decode_captured_pieces(
    white: &[u8],
    black: &[u8],
    white_points: u32,
    black_points: u32,
) -> CapturedPieces {
    CapturedPieces {
        white: decode_list(white),
        black: decode_list(black),
        white_points,
        black_points,
    }
}

fn decode_list(bytes: &[u8]) -> Vec<Piece> {
    bytes.iter().filter_map(|&code| decode_piece(code)).collect()
}

/// Pack captured pieces back into per-color byte lists.
pub fn encode_captured_pieces(captured: &CapturedPieces) -> (Vec<u8>, Vec<u8>) {
    (
        captured.white.iter().map(encode_piece).collect(),
        captured.black.iter().map(encode_piece).collect(),
    )
}
