//! Infrastructure 層
//!
//! ワイヤーフォーマット（DTO）、コンパクト盤面コーデック、WebSocket トランスポート、
//! Repository の具体的な実装を提供します。

pub mod codec;
pub mod dto;
pub mod repository;
pub mod transport;
