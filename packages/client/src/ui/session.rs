//! Sync session: composes the transport, reconciler and effect dispatcher.
//!
//! The session consumes transport events strictly in order. It keeps one
//! [`HistoryView`] per game and fires sound cues only when a viewed index
//! changes, so reviewing old positions never replays every intermediate cue.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, PoisonError},
    time::{Duration, Instant},
};

use tokio::sync::Mutex;

use crate::{
    domain::{
        BoardSetup, ClockTick, Color, GameHistory, GameHistoryRepository, GameId, MessageBoard,
        MessageScope, PlayerAction, PlayerMove, Position, ServerUpdate, Severity,
    },
    infrastructure::{
        repository::InMemoryGameHistoryRepository,
        transport::{TransportEvent, TransportHandle},
    },
    usecase::{
        DEFAULT_MESSAGE_TTL, EffectDispatcher, GameChange, ReconcileObserver,
        ReconcileSnapshotUseCase, SoundPlayer,
    },
};

/// Lifetime of the message shown once reconnecting has been given up.
const FAILURE_MESSAGE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Name used when creating or joining games; also decides the viewer's color.
    pub username: String,
    pub message_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            username: "guest".to_string(),
            message_ttl: DEFAULT_MESSAGE_TTL,
        }
    }
}

/// Viewed position within one game's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryView {
    index: usize,
}

impl HistoryView {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Move to `target`, clamped to the history.
    ///
    /// # Returns
    ///
    /// The new index when it changed
    fn move_to(&mut self, target: usize, len: usize) -> Option<usize> {
        let target = target.min(len.saturating_sub(1));
        if target == self.index {
            return None;
        }
        self.index = target;
        Some(target)
    }
}

/// History navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    First,
    Previous,
    Next,
    Last,
}

/// Intents from the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Create {
        board_setup: Option<BoardSetup>,
        color_preference: Option<Color>,
    },
    Join(GameId),
    Leave,
    Focus(GameId),
    /// Pick a square: the first pick is the source, the second sends the move.
    Select(Position),
    Move { from: Position, to: Position },
    Resign,
    OfferDraw,
    Refresh,
    Navigate(Navigation),
}

/// Local gesture state and the list of games the viewer takes part in.
#[derive(Debug, Default)]
pub struct GestureState {
    selection: StdMutex<Option<Position>>,
    bookmarks: StdMutex<Vec<GameId>>,
}

impl GestureState {
    pub fn selection(&self) -> Option<Position> {
        *self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_selection(&self, position: Option<Position>) {
        *self.selection.lock().unwrap_or_else(PoisonError::into_inner) = position;
    }

    pub fn bookmarks(&self) -> Vec<GameId> {
        self.bookmarks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn remove_bookmark(&self, game_id: &GameId) {
        self.bookmarks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|id| id != game_id);
    }
}

impl ReconcileObserver for GestureState {
    fn on_game_added(&self, game_id: &GameId) {
        let mut bookmarks = self.bookmarks.lock().unwrap_or_else(PoisonError::into_inner);
        if !bookmarks.contains(game_id) {
            bookmarks.push(game_id.clone());
        }
    }

    fn clear_pending_gesture(&self) {
        self.set_selection(None);
    }
}

pub struct SyncSession {
    config: SessionConfig,
    transport: TransportHandle,
    repository: Arc<dyn GameHistoryRepository>,
    messages: Arc<Mutex<MessageBoard>>,
    gesture: Arc<GestureState>,
    reconciler: ReconcileSnapshotUseCase,
    dispatcher: EffectDispatcher,
    views: HashMap<GameId, HistoryView>,
    active_game: Option<GameId>,
    out_of_time_sent: Vec<GameId>,
}

impl SyncSession {
    pub fn new(
        config: SessionConfig,
        transport: TransportHandle,
        sound_player: Arc<dyn SoundPlayer>,
    ) -> Self {
        let repository: Arc<dyn GameHistoryRepository> =
            Arc::new(InMemoryGameHistoryRepository::new());
        let messages = Arc::new(Mutex::new(MessageBoard::new()));
        let gesture = Arc::new(GestureState::default());
        let reconciler = ReconcileSnapshotUseCase::new(
            Arc::clone(&repository),
            Arc::clone(&messages),
            gesture.clone(),
            config.message_ttl,
        );

        Self {
            config,
            transport,
            repository,
            messages,
            gesture,
            reconciler,
            dispatcher: EffectDispatcher::with_sound_player(sound_player),
            views: HashMap::new(),
            active_game: None,
            out_of_time_sent: Vec::new(),
        }
    }

    pub fn username(&self) -> &str {
        &self.config.username
    }

    pub fn active_game(&self) -> Option<&GameId> {
        self.active_game.as_ref()
    }

    /// Games the viewer takes part in, in the order they were first seen.
    pub fn games(&self) -> Vec<GameId> {
        self.gesture.bookmarks()
    }

    pub fn selection(&self) -> Option<Position> {
        self.gesture.selection()
    }

    pub fn messages(&self) -> Arc<Mutex<MessageBoard>> {
        Arc::clone(&self.messages)
    }

    pub fn transport(&self) -> &TransportHandle {
        &self.transport
    }

    /// History of the active game and the viewed index within it.
    pub async fn active_view(&self) -> Option<(GameHistory, usize)> {
        let game_id = self.active_game.as_ref()?;
        let history = self.repository.find(game_id).await?;
        let index = self.views.get(game_id).map_or(0, HistoryView::index);
        Some((history, index))
    }

    /// Color the viewer plays in `history`; spectators watch from white.
    pub fn viewer_color(&self, history: &GameHistory) -> Color {
        history
            .players()
            .color_of(&self.config.username)
            .unwrap_or(Color::White)
    }

    /// Handle one transport event.
    ///
    /// # Returns
    ///
    /// `true` when the active game's viewed snapshot changed
    pub async fn handle_event(&mut self, event: TransportEvent) -> bool {
        match event {
            TransportEvent::Opened { reconnected } => {
                if reconnected {
                    self.rejoin_games();
                }
                false
            }
            TransportEvent::Envelope(envelope) => self.apply_update(envelope.into_update()).await,
            TransportEvent::Closed { reason } => {
                tracing::info!(
                    "Connection lost: {}",
                    reason.as_deref().unwrap_or("closed by server")
                );
                false
            }
            TransportEvent::Reconnecting { attempt, delay } => {
                tracing::info!("Reconnecting (attempt {}) in {:?}", attempt, delay);
                false
            }
            TransportEvent::Failed => {
                self.push_message(
                    MessageScope::Application,
                    "Connection to the server was lost. Restart the client to try again.",
                    Severity::Error,
                    FAILURE_MESSAGE_TTL,
                )
                .await;
                false
            }
        }
    }

    /// Reconcile one decoded server push.
    pub async fn apply_update(&mut self, update: ServerUpdate) -> bool {
        let outcome = match self.reconciler.execute(update).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("{}", e);
                return false;
            }
        };

        match outcome.change {
            None | Some(GameChange::Refreshed(_)) => false,
            Some(GameChange::Added(game_id)) => {
                self.views.insert(game_id.clone(), HistoryView::default());
                if self.active_game.is_none() {
                    self.active_game = Some(game_id.clone());
                }
                self.is_active(&game_id)
            }
            Some(GameChange::Appended { game_id, len }) => {
                let view = self.views.entry(game_id.clone()).or_default();
                // Follow the tip only while the viewer was looking at it.
                if view.index() + 2 == len {
                    self.move_view(&game_id, len - 1).await
                } else {
                    false
                }
            }
        }
    }

    /// Apply one front-end intent.
    ///
    /// # Returns
    ///
    /// `true` when the active game's viewed snapshot changed
    pub async fn apply(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Create {
                board_setup,
                color_preference,
            } => {
                self.transport.send(PlayerAction::CreateGame {
                    username: self.config.username.clone(),
                    game_id: None,
                    board_setup,
                    color_preference,
                });
                false
            }
            SessionCommand::Join(game_id) => {
                self.transport.send(PlayerAction::JoinGame {
                    username: self.config.username.clone(),
                    game_id: game_id.clone(),
                });
                self.active_game = Some(game_id);
                true
            }
            SessionCommand::Focus(game_id) => {
                if self.views.contains_key(&game_id) {
                    self.active_game = Some(game_id);
                    true
                } else {
                    self.warn_app(&format!("Unknown game {game_id}")).await;
                    false
                }
            }
            SessionCommand::Leave => {
                let Some(game_id) = self.require_active().await else {
                    return false;
                };
                self.transport.send(PlayerAction::LeaveGame {
                    game_id: game_id.clone(),
                });
                // Drop the local history too, so a later join tracks the game afresh.
                if let Err(e) = self.repository.remove(&game_id).await {
                    tracing::debug!("{}", e);
                }
                self.gesture.remove_bookmark(&game_id);
                self.views.remove(&game_id);
                self.out_of_time_sent.retain(|id| *id != game_id);
                self.active_game = self.gesture.bookmarks().into_iter().next();
                true
            }
            SessionCommand::Select(position) => {
                let Some(game_id) = self.require_active().await else {
                    return false;
                };
                match self.gesture.selection() {
                    None => self.gesture.set_selection(Some(position)),
                    Some(from) if from == position => self.gesture.set_selection(None),
                    Some(from) => self.send_move(game_id, from, position),
                }
                false
            }
            SessionCommand::Move { from, to } => {
                let Some(game_id) = self.require_active().await else {
                    return false;
                };
                self.gesture.set_selection(Some(from));
                self.send_move(game_id, from, to);
                false
            }
            SessionCommand::Resign => {
                if let Some(game_id) = self.require_active().await {
                    self.transport.send(PlayerAction::Resign { game_id });
                }
                false
            }
            SessionCommand::OfferDraw => {
                if let Some(game_id) = self.require_active().await {
                    self.transport.send(PlayerAction::OfferDraw { game_id });
                }
                false
            }
            SessionCommand::Refresh => {
                if let Some(game_id) = self.require_active().await {
                    self.transport.send(PlayerAction::GetGameState { game_id });
                }
                false
            }
            SessionCommand::Navigate(navigation) => self.navigate(navigation).await,
        }
    }

    /// One-second countdown tick for every tracked game.
    ///
    /// Sends `lose-via-out-of-time` once when the viewer's own clock runs out.
    pub async fn tick_clocks(&mut self) {
        for game_id in self.gesture.bookmarks() {
            let tick = match self.repository.tick_clock(&game_id).await {
                Ok(tick) => tick,
                Err(e) => {
                    tracing::debug!("{}", e);
                    continue;
                }
            };

            let ClockTick::Expired(color) = tick else {
                continue;
            };
            let Some(history) = self.repository.find(&game_id).await else {
                continue;
            };
            let own_clock = history.players().color_of(&self.config.username) == Some(color);
            if own_clock && !self.out_of_time_sent.contains(&game_id) {
                tracing::info!("Clock expired in game {}", game_id);
                self.transport.send(PlayerAction::LoseViaOutOfTime {
                    game_id: game_id.clone(),
                });
                self.out_of_time_sent.push(game_id);
            }
        }
    }

    /// Drop expired display messages.
    pub async fn prune_messages(&self) -> usize {
        self.messages.lock().await.prune_expired(Instant::now())
    }

    fn rejoin_games(&self) {
        for game_id in self.gesture.bookmarks() {
            tracing::info!("Re-joining game {}", game_id);
            self.transport.send(PlayerAction::JoinGame {
                username: self.config.username.clone(),
                game_id,
            });
        }
    }

    fn send_move(&self, game_id: GameId, from: Position, to: Position) {
        self.transport.send(PlayerAction::MovePiece {
            game_id,
            player_move: PlayerMove { from, to },
        });
    }

    async fn navigate(&mut self, navigation: Navigation) -> bool {
        let Some(game_id) = self.active_game.clone() else {
            return false;
        };
        let Some(history) = self.repository.find(&game_id).await else {
            return false;
        };
        let index = self.views.get(&game_id).map_or(0, HistoryView::index);
        let target = match navigation {
            Navigation::First => 0,
            Navigation::Previous => index.saturating_sub(1),
            Navigation::Next => index + 1,
            Navigation::Last => history.len().saturating_sub(1),
        };
        self.move_view(&game_id, target).await
    }

    /// Move a game's view and fire the cue for the old and new viewed snapshots.
    async fn move_view(&mut self, game_id: &GameId, target: usize) -> bool {
        let Some(history) = self.repository.find(game_id).await else {
            return false;
        };
        let view = self.views.entry(game_id.clone()).or_default();
        let from = view.index();
        let Some(to) = view.move_to(target, history.len()) else {
            return false;
        };

        if let (Some(previous), Some(next)) = (history.get(from), history.get(to)) {
            let viewer = self.viewer_color(&history);
            self.dispatcher.dispatch(previous, next, viewer);
        }

        self.is_active(game_id)
    }

    fn is_active(&self, game_id: &GameId) -> bool {
        self.active_game.as_ref() == Some(game_id)
    }

    async fn require_active(&self) -> Option<GameId> {
        let game_id = self.active_game.clone();
        if game_id.is_none() {
            self.warn_app("No active game. Create or join one first.").await;
        }
        game_id
    }

    async fn warn_app(&self, text: &str) {
        self.push_message(
            MessageScope::Application,
            text,
            Severity::Warning,
            self.config.message_ttl,
        )
        .await;
    }

    async fn push_message(&self, scope: MessageScope, text: &str, severity: Severity, ttl: Duration) {
        self.messages
            .lock()
            .await
            .push_unique(scope, text, severity, ttl, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            GameClock, GameMetadata, GameRecord, GameSnapshot, GameStatus, PieceType,
            entity::fixtures::{board_with, connected_players, piece, snapshot},
        },
        infrastructure::transport::ConnectionStatus,
        usecase::dispatch_effect::{MockSoundPlayer, SoundEffect},
    };
    use mockall::predicate::eq;
    use serde_json::Value;
    use tokio::sync::mpsc;

    fn game_id(id: &str) -> GameId {
        GameId::new(id.to_string()).unwrap()
    }

    fn quiet_player() -> MockSoundPlayer {
        let mut player = MockSoundPlayer::new();
        player.expect_play().return_const(());
        player
    }

    fn create_session(
        player: MockSoundPlayer,
    ) -> (SyncSession, mpsc::UnboundedReceiver<String>) {
        let (handle, outbound, _status) = TransportHandle::detached("game", ConnectionStatus::Open);
        let config = SessionConfig {
            username: "alice".to_string(),
            message_ttl: DEFAULT_MESSAGE_TTL,
        };
        (SyncSession::new(config, handle, Arc::new(player)), outbound)
    }

    fn update(id: &str, snapshot: GameSnapshot, clock: Option<GameClock>) -> ServerUpdate {
        ServerUpdate {
            status_code: 200,
            connection_id: None,
            notices: vec![],
            game: Some(GameRecord {
                id: game_id(id),
                metadata: GameMetadata {
                    players: connected_players(),
                    clock,
                },
                snapshot,
            }),
        }
    }

    fn sent_frames(outbound: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = outbound.try_recv() {
            frames.push(serde_json::from_str(&frame).unwrap());
        }
        frames
    }

    fn pawn_moved() -> GameSnapshot {
        let board = board_with(&[(Position::new(3, 4), piece(PieceType::Pawn, Color::White))]);
        snapshot(GameStatus::InProgress, Color::Black, board)
    }

    fn start_position(status: GameStatus) -> GameSnapshot {
        let board = board_with(&[(Position::new(1, 4), piece(PieceType::Pawn, Color::White))]);
        snapshot(status, Color::White, board)
    }

    #[tokio::test]
    async fn test_view_follows_tip_and_fires_once_per_change() {
        // テスト項目: 最新局面を表示中は新しいスナップショットに追従し、効果音は 1 回だけ鳴る
        // given (前提条件):
        let mut player = MockSoundPlayer::new();
        player
            .expect_play()
            .with(eq(SoundEffect::GameStart))
            .times(1)
            .return_const(());
        player
            .expect_play()
            .with(eq(SoundEffect::MoveSelf))
            .times(1)
            .return_const(());
        let (mut session, _outbound) = create_session(player);

        // when (操作):
        assert!(session.apply_update(update("g1", start_position(GameStatus::NotStarted), None)).await);
        assert!(session.apply_update(update("g1", start_position(GameStatus::InProgress), None)).await);
        assert!(session.apply_update(update("g1", pawn_moved(), None)).await);
        // 同じスナップショットの再送では何も起きない
        assert!(!session.apply_update(update("g1", pawn_moved(), None)).await);

        // then (期待する結果):
        let (history, index) = session.active_view().await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(index, 2);
    }

    #[tokio::test]
    async fn test_reviewing_history_does_not_follow_tip() {
        // テスト項目: 過去の局面を表示中は新しいスナップショットが来ても表示位置を動かさない
        // given (前提条件):
        let (mut session, _outbound) = create_session(quiet_player());
        session.apply_update(update("g1", start_position(GameStatus::NotStarted), None)).await;
        session.apply_update(update("g1", start_position(GameStatus::InProgress), None)).await;

        // when (操作):
        assert!(session.apply(SessionCommand::Navigate(Navigation::First)).await);
        let moved = session.apply_update(update("g1", pawn_moved(), None)).await;

        // then (期待する結果):
        assert!(!moved);
        let (history, index) = session.active_view().await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(index, 0);
        assert!(session.apply(SessionCommand::Navigate(Navigation::Last)).await);
        assert!(!session.apply(SessionCommand::Navigate(Navigation::Next)).await);
        assert_eq!(session.active_view().await.unwrap().1, 2);
    }

    #[tokio::test]
    async fn test_navigation_replays_only_the_crossed_pair() {
        // テスト項目: 表示位置を 1 つ進めると、その 2 局面の差分の効果音のみが鳴る
        // given (前提条件):
        let mut player = MockSoundPlayer::new();
        player
            .expect_play()
            .with(eq(SoundEffect::GameStart))
            .times(2)
            .return_const(());
        let (mut session, _outbound) = create_session(player);
        session.apply_update(update("g1", start_position(GameStatus::NotStarted), None)).await;
        session.apply_update(update("g1", start_position(GameStatus::InProgress), None)).await;

        // when (操作): 先頭へ戻ってから 1 つ進める
        session.apply(SessionCommand::Navigate(Navigation::First)).await;
        session.apply(SessionCommand::Navigate(Navigation::Previous)).await;
        session.apply(SessionCommand::Navigate(Navigation::Next)).await;

        // then (期待する結果): times(2) の検証はモックのドロップ時に行われる
        assert_eq!(session.active_view().await.unwrap().1, 1);
    }

    #[tokio::test]
    async fn test_backward_step_compares_old_and_new_view() {
        // テスト項目: 1 つ戻ると、直前に表示していた局面から戻り先の局面への差分で効果音が鳴る
        // given (前提条件): 開始前 -> 開始 -> 白の着手、表示は最新局面
        let mut player = MockSoundPlayer::new();
        player
            .expect_play()
            .with(eq(SoundEffect::GameStart))
            .times(1)
            .return_const(());
        player
            .expect_play()
            .with(eq(SoundEffect::MoveSelf))
            .times(1)
            .return_const(());
        player
            .expect_play()
            .with(eq(SoundEffect::MoveOpponent))
            .times(1)
            .return_const(());
        let (mut session, _outbound) = create_session(player);
        session.apply_update(update("g1", start_position(GameStatus::NotStarted), None)).await;
        session.apply_update(update("g1", start_position(GameStatus::InProgress), None)).await;
        session.apply_update(update("g1", pawn_moved(), None)).await;

        // when (操作): 2 -> 1 へ戻る（着手後の局面から白番の局面への比較）
        let moved = session.apply(SessionCommand::Navigate(Navigation::Previous)).await;

        // then (期待する結果): 開始の効果音は再生されず、相手の着手として扱われる
        assert!(moved);
        assert_eq!(session.active_view().await.unwrap().1, 1);
    }

    #[tokio::test]
    async fn test_leave_then_rejoin_tracks_game_again() {
        // テスト項目: 退出後に再参加したゲームは一覧・再接続時の再参加・最新局面の追従の対象に戻る
        // given (前提条件):
        let (mut session, mut outbound) = create_session(quiet_player());
        session.apply_update(update("g1", start_position(GameStatus::NotStarted), None)).await;
        session.apply_update(update("g1", start_position(GameStatus::InProgress), None)).await;
        session.apply_update(update("g1", pawn_moved(), None)).await;
        session.apply(SessionCommand::Leave).await;

        // when (操作): 再参加し、サーバーから同じゲームのレコードが届く
        session.apply(SessionCommand::Join(game_id("g1"))).await;
        assert!(session.apply_update(update("g1", start_position(GameStatus::InProgress), None)).await);
        assert!(session.apply_update(update("g1", pawn_moved(), None)).await);
        sent_frames(&mut outbound);
        session.handle_event(TransportEvent::Opened { reconnected: true }).await;

        // then (期待する結果):
        assert_eq!(session.games(), vec![game_id("g1")]);
        let (history, index) = session.active_view().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(index, 1);
        let frames = sent_frames(&mut outbound);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["data"]["join-game"]["gameId"], "g1");
    }

    #[tokio::test]
    async fn test_rejoins_games_after_reconnect() {
        // テスト項目: 再接続後に参加中の全ゲームへ join-game を再送する
        // given (前提条件):
        let (mut session, mut outbound) = create_session(quiet_player());
        session.apply_update(update("g1", start_position(GameStatus::NotStarted), None)).await;
        session.apply_update(update("g2", start_position(GameStatus::NotStarted), None)).await;

        // when (操作):
        session.handle_event(TransportEvent::Opened { reconnected: false }).await;
        assert!(sent_frames(&mut outbound).is_empty());
        session.handle_event(TransportEvent::Opened { reconnected: true }).await;

        // then (期待する結果):
        let frames = sent_frames(&mut outbound);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["data"]["join-game"]["gameId"], "g1");
        assert_eq!(frames[1]["data"]["join-game"]["gameId"], "g2");
        assert_eq!(frames[1]["data"]["join-game"]["username"], "alice");
    }

    #[tokio::test]
    async fn test_own_clock_expiry_sends_single_timeout() {
        // テスト項目: 自分の持ち時間が 0 になると lose-via-out-of-time を 1 度だけ送信する
        // given (前提条件): alice（白）の残り 2 秒、白番で進行中
        let (mut session, mut outbound) = create_session(quiet_player());
        let clock = GameClock {
            white_seconds_left: 2,
            black_seconds_left: 60,
            last_move_at: None,
            both_players_last_connected_at: None,
        };
        session
            .apply_update(update("g1", start_position(GameStatus::InProgress), Some(clock)))
            .await;

        // when (操作):
        for _ in 0..4 {
            session.tick_clocks().await;
        }

        // then (期待する結果):
        let frames = sent_frames(&mut outbound);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["data"]["lose-via-out-of-time"]["gameId"], "g1");
    }

    #[tokio::test]
    async fn test_opponent_clock_expiry_is_not_reported() {
        // テスト項目: 相手の持ち時間切れは自分からは送信しない
        // given (前提条件): 黒番で黒の残り 1 秒
        let (mut session, mut outbound) = create_session(quiet_player());
        let clock = GameClock {
            white_seconds_left: 60,
            black_seconds_left: 1,
            last_move_at: None,
            both_players_last_connected_at: None,
        };
        session.apply_update(update("g1", pawn_moved(), Some(clock))).await;

        // when (操作):
        session.tick_clocks().await;

        // then (期待する結果):
        assert!(sent_frames(&mut outbound).is_empty());
    }

    #[tokio::test]
    async fn test_select_twice_sends_move_and_reconcile_clears_selection() {
        // テスト項目: 2 回のマス選択で move-piece を送信し、次の取り込みで選択状態が解除される
        // given (前提条件):
        let (mut session, mut outbound) = create_session(quiet_player());
        session.apply_update(update("g1", start_position(GameStatus::InProgress), None)).await;

        // when (操作):
        session.apply(SessionCommand::Select(Position::new(1, 4))).await;
        assert_eq!(session.selection(), Some(Position::new(1, 4)));
        session.apply(SessionCommand::Select(Position::new(3, 4))).await;

        // then (期待する結果):
        let frames = sent_frames(&mut outbound);
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0]["data"]["move-piece"]["playerMove"]["to"],
            serde_json::json!({"rank": 3, "file": 4})
        );
        assert!(session.selection().is_some());

        session.apply_update(update("g1", pawn_moved(), None)).await;
        assert_eq!(session.selection(), None);
    }

    #[tokio::test]
    async fn test_terminal_failure_surfaces_app_error() {
        // テスト項目: 再接続の断念はアプリスコープのエラーメッセージとして表示される
        let (mut session, _outbound) = create_session(quiet_player());

        session.handle_event(TransportEvent::Failed).await;

        let messages = session.messages();
        let messages = messages.lock().await;
        let pending = messages.pending(&MessageScope::Application);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_commands_without_active_game_warn() {
        // テスト項目: アクティブなゲームがない状態での操作は警告のみで送信しない
        let (mut session, mut outbound) = create_session(quiet_player());

        session.apply(SessionCommand::Resign).await;

        assert!(sent_frames(&mut outbound).is_empty());
        let messages = session.messages();
        assert_eq!(
            messages.lock().await.pending(&MessageScope::Application)[0].severity,
            Severity::Warning
        );
    }

    #[tokio::test]
    async fn test_leave_forgets_game() {
        // テスト項目: 退出するとゲームが参加中の一覧から外れる
        let (mut session, mut outbound) = create_session(quiet_player());
        session.apply_update(update("g1", start_position(GameStatus::NotStarted), None)).await;

        session.apply(SessionCommand::Leave).await;

        let frames = sent_frames(&mut outbound);
        assert_eq!(frames[0]["data"]["leave-game"]["gameId"], "g1");
        assert!(session.games().is_empty());
        assert!(session.active_game().is_none());
    }
}
