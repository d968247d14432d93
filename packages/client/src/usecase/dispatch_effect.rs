//! UseCase: スナップショット差分からの効果音ディスパッチ
//!
//! Rules are evaluated in order and only the first match fires. Several rules
//! can match the same transition (a capture is also a move), so the order of
//! [`EffectDispatcher::canonical_rules`] is part of the contract.

use std::sync::Arc;

use crate::domain::{Color, GameSnapshot, GameStatus, PieceType, Position};

/// Presentation cue selected by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    GameStart,
    Check,
    Promotion,
    Castle,
    Capture,
    MoveSelf,
    MoveOpponent,
}

impl SoundEffect {
    pub fn name(self) -> &'static str {
        match self {
            SoundEffect::GameStart => "game-start",
            SoundEffect::Check => "check",
            SoundEffect::Promotion => "promotion",
            SoundEffect::Castle => "castle",
            SoundEffect::Capture => "capture",
            SoundEffect::MoveSelf => "move-self",
            SoundEffect::MoveOpponent => "move-opponent",
        }
    }
}

/// Sink for sound cues.
#[cfg_attr(test, mockall::automock)]
pub trait SoundPlayer: Send + Sync {
    fn play(&self, effect: SoundEffect);
}

/// `did_change(previous, next, viewer)`.
pub type ChangePredicate = fn(&GameSnapshot, &GameSnapshot, Color) -> bool;

/// One `(predicate, action)` pair.
pub struct EffectRule {
    name: &'static str,
    did_change: ChangePredicate,
    action: Box<dyn Fn() + Send + Sync>,
}

impl EffectRule {
    pub fn new(
        name: &'static str,
        did_change: ChangePredicate,
        action: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            did_change,
            action: Box::new(action),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl std::fmt::Debug for EffectRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRule").field("name", &self.name).finish()
    }
}

/// Ordered, first-match-wins rule list.
#[derive(Debug)]
pub struct EffectDispatcher {
    rules: Vec<EffectRule>,
}

impl EffectDispatcher {
    pub fn new(rules: Vec<EffectRule>) -> Self {
        Self { rules }
    }

    /// Dispatcher with the canonical rules wired to a sound player.
    pub fn with_sound_player(player: Arc<dyn SoundPlayer>) -> Self {
        Self::new(Self::canonical_rules(player))
    }

    /// game-start, check, promotion, castle, capture, move-self, move-opponent.
    pub fn canonical_rules(player: Arc<dyn SoundPlayer>) -> Vec<EffectRule> {
        let table: [(SoundEffect, ChangePredicate); 7] = [
            (SoundEffect::GameStart, game_started),
            (SoundEffect::Check, check_given),
            (SoundEffect::Promotion, promoted),
            (SoundEffect::Castle, castled),
            (SoundEffect::Capture, captured),
            (SoundEffect::MoveSelf, moved_by_self),
            (SoundEffect::MoveOpponent, moved_by_opponent),
        ];

        table
            .into_iter()
            .map(|(effect, did_change)| {
                let player = Arc::clone(&player);
                EffectRule::new(effect.name(), did_change, move || player.play(effect))
            })
            .collect()
    }

    /// Fire the first rule matching the `previous -> next` transition.
    ///
    /// # Returns
    ///
    /// The name of the rule that fired, if any
    pub fn dispatch(
        &self,
        previous: &GameSnapshot,
        next: &GameSnapshot,
        viewer: Color,
    ) -> Option<&'static str> {
        let rule = self
            .rules
            .iter()
            .find(|rule| (rule.did_change)(previous, next, viewer))?;
        tracing::debug!("Effect rule matched: {}", rule.name);
        (rule.action)();
        Some(rule.name)
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(EffectRule::name).collect()
    }
}

pub fn game_started(previous: &GameSnapshot, next: &GameSnapshot, _viewer: Color) -> bool {
    previous.status == GameStatus::NotStarted && next.status == GameStatus::InProgress
}

pub fn check_given(previous: &GameSnapshot, next: &GameSnapshot, _viewer: Color) -> bool {
    previous.in_check.is_none() && next.in_check.is_some()
}

/// Net gain in queens. Under-promotions go unnoticed.
pub fn promoted(previous: &GameSnapshot, next: &GameSnapshot, _viewer: Color) -> bool {
    next.board.count(PieceType::Queen) > previous.board.count(PieceType::Queen)
}

/// A king on either back rank stands two files away from where a king stood before.
pub fn castled(previous: &GameSnapshot, next: &GameSnapshot, _viewer: Color) -> bool {
    let last_rank = next.board.dimensions().ranks - 1;
    next.board
        .pieces()
        .filter(|(position, piece)| {
            piece.piece_type == PieceType::King
                && (position.rank == 0 || position.rank == last_rank)
        })
        .any(|(position, _)| {
            [position.file.checked_sub(2), position.file.checked_add(2)]
                .into_iter()
                .flatten()
                .any(|file| {
                    let before = Position::new(position.rank, file);
                    previous
                        .board
                        .get(before)
                        .is_some_and(|piece| piece.piece_type == PieceType::King)
                })
        })
}

pub fn captured(previous: &GameSnapshot, next: &GameSnapshot, _viewer: Color) -> bool {
    next.captured_pieces.total() > previous.captured_pieces.total()
}

/// The viewer just moved: it is no longer their turn and pieces moved.
pub fn moved_by_self(previous: &GameSnapshot, next: &GameSnapshot, viewer: Color) -> bool {
    next.current_turn != viewer && !previous.board.same_placement(&next.board)
}

pub fn moved_by_opponent(previous: &GameSnapshot, next: &GameSnapshot, viewer: Color) -> bool {
    next.current_turn == viewer && !previous.board.same_placement(&next.board)
}
