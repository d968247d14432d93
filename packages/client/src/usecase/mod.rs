//! UseCase 層
//!
//! サーバーから届いたスナップショットの取り込みと、スナップショット差分からの
//! 効果音ディスパッチを実装するレイヤー。UI 層から呼び出され、Domain 層を操作します。

pub mod dispatch_effect;
pub mod error;
pub mod reconcile_snapshot;

pub use dispatch_effect::{EffectDispatcher, EffectRule, SoundEffect, SoundPlayer};
pub use error::ReconcileError;
pub use reconcile_snapshot::{
    DEFAULT_MESSAGE_TTL, GameChange, ReconcileObserver, ReconcileOutcome,
    ReconcileSnapshotUseCase,
};
