//! UseCase: サーバー更新の取り込み（スナップショット整合）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ReconcileSnapshotUseCase::execute() メソッド
//! - 未知のゲーム ID での履歴作成、既知のゲームへの追記、変化のない更新の扱い
//! - 表示メッセージのスコープ振り分けと重複排除
//!
//! ### なぜこのテストが必要か
//! - 履歴は追記専用で、既存のスナップショットを変更してはならない
//! - 冗長なサーバープッシュで同じ通知が二重表示されないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規ゲーム、連続するスナップショット
//! - エッジケース：同一スナップショットの再送（メタデータのみ更新）、ゲームを含まない通知

use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;

use crate::domain::{
    GameHistory, GameHistoryRepository, GameId, GameRecord, MessageBoard, MessageScope,
    ServerNotice, ServerUpdate,
};

use super::error::ReconcileError;

/// Default lifetime of a display message.
pub const DEFAULT_MESSAGE_TTL: Duration = Duration::from_secs(5);

/// Callbacks fired by the reconciler.
#[cfg_attr(test, mockall::automock)]
pub trait ReconcileObserver: Send + Sync {
    /// A game id was seen for the first time.
    fn on_game_added(&self, game_id: &GameId);

    /// Any optimistic local gesture (drag, selection) must be dropped.
    fn clear_pending_gesture(&self);
}

/// What happened to the game history during one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameChange {
    /// A new history was created, seeded with the update's snapshot.
    Added(GameId),
    /// A new tip snapshot was appended; `len` is the new history length.
    Appended { game_id: GameId, len: usize },
    /// The snapshot matched the tip; only record metadata was replaced.
    Refreshed(GameId),
}

impl GameChange {
    pub fn game_id(&self) -> &GameId {
        match self {
            GameChange::Added(game_id)
            | GameChange::Appended { game_id, .. }
            | GameChange::Refreshed(game_id) => game_id,
        }
    }
}

/// Result of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub change: Option<GameChange>,
    pub messages_added: usize,
}

/// スナップショット整合のユースケース
pub struct ReconcileSnapshotUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn GameHistoryRepository>,
    messages: Arc<Mutex<MessageBoard>>,
    observer: Arc<dyn ReconcileObserver>,
    message_ttl: Duration,
}

impl ReconcileSnapshotUseCase {
    pub fn new(
        repository: Arc<dyn GameHistoryRepository>,
        messages: Arc<Mutex<MessageBoard>>,
        observer: Arc<dyn ReconcileObserver>,
        message_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            messages,
            observer,
            message_ttl,
        }
    }

    /// Merge one server update into the local state.
    ///
    /// # Arguments
    ///
    /// * `update` - The decoded server push
    ///
    /// # Returns
    ///
    /// * `Ok(ReconcileOutcome)` - What changed
    /// * `Err(ReconcileError)` - The history store rejected the change
    pub async fn execute(&self, update: ServerUpdate) -> Result<ReconcileOutcome, ReconcileError> {
        // 1. 楽観的なローカル操作はサーバーの結果で上書きされる
        self.observer.clear_pending_gesture();

        let scope = match &update.game {
            Some(record) => MessageScope::Game(record.id.clone()),
            None => MessageScope::Application,
        };

        // 2. ゲームレコードを履歴に取り込む
        let change = match update.game {
            Some(record) => Some(self.merge(record).await?),
            None => None,
        };

        // 3. 表示メッセージを重複排除しつつ追加
        let messages_added = self.push_notices(&scope, &update.notices).await;

        Ok(ReconcileOutcome {
            change,
            messages_added,
        })
    }

    async fn merge(&self, record: GameRecord) -> Result<GameChange, ReconcileError> {
        let id = record.id;
        let snapshot = record.snapshot;

        let Some(history) = self.repository.find(&id).await else {
            tracing::info!("Tracking new game {}", id);
            let history = GameHistory::new(id.clone(), record.metadata, Arc::new(snapshot));
            self.repository.insert(history).await?;
            self.observer.on_game_added(&id);
            return Ok(GameChange::Added(id));
        };

        if **history.latest() == snapshot {
            tracing::debug!("Game {} unchanged; refreshing metadata", id);
            self.repository.refresh(&id, record.metadata).await?;
            return Ok(GameChange::Refreshed(id));
        }

        let len = self
            .repository
            .append(&id, Arc::new(snapshot), record.metadata)
            .await?;
        tracing::debug!("Game {} advanced to snapshot #{}", id, len - 1);
        Ok(GameChange::Appended { game_id: id, len })
    }

    async fn push_notices(&self, scope: &MessageScope, notices: &[ServerNotice]) -> usize {
        if notices.is_empty() {
            return 0;
        }

        let now = std::time::Instant::now();
        let mut messages = self.messages.lock().await;
        let mut added = 0;
        for notice in notices {
            if messages.push_unique(
                scope.clone(),
                &notice.text,
                notice.severity,
                self.message_ttl,
                now,
            ) {
                added += 1;
            }
        }
        added
    }
}
