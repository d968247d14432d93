//! Repository trait for per-game histories.
//!
//! The reconciler depends on this trait only; the in-memory implementation
//! lives in the infrastructure layer.

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    entity::{ClockTick, GameHistory, GameMetadata, GameSnapshot},
    error::RepositoryError,
    value_object::GameId,
};

/// Storage of game histories, keyed by game id.
#[async_trait]
pub trait GameHistoryRepository: Send + Sync {
    /// Clone of the stored history (snapshots are shared, not copied).
    async fn find(&self, game_id: &GameId) -> Option<GameHistory>;

    /// Store a brand-new history.
    async fn insert(&self, history: GameHistory) -> Result<(), RepositoryError>;

    /// Append a snapshot to an existing history.
    ///
    /// # Returns
    ///
    /// The new history length
    async fn append(
        &self,
        game_id: &GameId,
        snapshot: Arc<GameSnapshot>,
        metadata: GameMetadata,
    ) -> Result<usize, RepositoryError>;

    /// Replace record metadata of an existing history, keeping its snapshots.
    async fn refresh(&self, game_id: &GameId, metadata: GameMetadata)
    -> Result<(), RepositoryError>;

    /// Advance the countdown clock of one game by one second.
    async fn tick_clock(&self, game_id: &GameId) -> Result<ClockTick, RepositoryError>;

    /// Forget a game entirely so it can be tracked afresh later.
    async fn remove(&self, game_id: &GameId) -> Result<GameHistory, RepositoryError>;

    /// Ids of every known game, in insertion order.
    async fn game_ids(&self) -> Vec<GameId>;
}
