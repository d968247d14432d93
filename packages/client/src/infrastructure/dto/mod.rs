//! Wire DTOs for the game websocket protocol.

pub mod envelope;
pub mod game;

pub use envelope::{InboundEnvelope, OutboundEnvelope, ServerMessageDto};
pub use game::{
    CompactBoardDto, CompactCapturedPiecesDto, DecodeError, DimensionsDto, GameRecordDto,
    GameTimeDto, SnapshotDto,
};
