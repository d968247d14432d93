//! InMemory GameHistory Repository 実装
//!
//! ドメイン層が定義する GameHistoryRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用し、ゲームの登録順も保持します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ClockTick, GameHistory, GameHistoryRepository, GameId, GameMetadata, GameSnapshot,
    RepositoryError,
};

#[derive(Default)]
struct Store {
    histories: HashMap<GameId, GameHistory>,
    order: Vec<GameId>,
}

/// インメモリ GameHistory Repository 実装
#[derive(Default)]
pub struct InMemoryGameHistoryRepository {
    store: Mutex<Store>,
}

impl InMemoryGameHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameHistoryRepository for InMemoryGameHistoryRepository {
    async fn find(&self, game_id: &GameId) -> Option<GameHistory> {
        let store = self.store.lock().await;
        store.histories.get(game_id).cloned()
    }

    async fn insert(&self, history: GameHistory) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().await;
        let id = history.id().clone();
        if store.histories.contains_key(&id) {
            return Err(RepositoryError::GameAlreadyExists(id));
        }
        store.order.push(id.clone());
        store.histories.insert(id, history);
        Ok(())
    }

    async fn append(
        &self,
        game_id: &GameId,
        snapshot: Arc<GameSnapshot>,
        metadata: GameMetadata,
    ) -> Result<usize, RepositoryError> {
        let mut store = self.store.lock().await;
        let history = store
            .histories
            .get_mut(game_id)
            .ok_or_else(|| RepositoryError::GameNotFound(game_id.clone()))?;
        history.push(snapshot, metadata);
        Ok(history.len())
    }

    async fn refresh(
        &self,
        game_id: &GameId,
        metadata: GameMetadata,
    ) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().await;
        let history = store
            .histories
            .get_mut(game_id)
            .ok_or_else(|| RepositoryError::GameNotFound(game_id.clone()))?;
        history.refresh(metadata);
        Ok(())
    }

    async fn tick_clock(&self, game_id: &GameId) -> Result<ClockTick, RepositoryError> {
        let mut store = self.store.lock().await;
        let history = store
            .histories
            .get_mut(game_id)
            .ok_or_else(|| RepositoryError::GameNotFound(game_id.clone()))?;
        Ok(history.tick_clock())
    }

    async fn remove(&self, game_id: &GameId) -> Result<GameHistory, RepositoryError> {
        let mut store = self.store.lock().await;
        let history = store
            .histories
            .remove(game_id)
            .ok_or_else(|| RepositoryError::GameNotFound(game_id.clone()))?;
        store.order.retain(|id| id != game_id);
        Ok(history)
    }

    async fn game_ids(&self) -> Vec<GameId> {
        let store = self.store.lock().await;
        store.order.clone()
    }
}
