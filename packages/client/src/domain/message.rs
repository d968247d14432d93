//! Display messages derived from server envelopes.
//!
//! These never travel on the wire. They are keyed to a game (when the
//! envelope carried a snapshot) or to the application, and expire after a
//! time-to-live.

use std::time::{Duration, Instant};

use uuid::Uuid;

use super::value_object::{GameId, Severity};

/// Where a display message should be shown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageScope {
    Application,
    Game(GameId),
}

/// A pending display message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMessage {
    pub id: Uuid,
    pub scope: MessageScope,
    pub text: String,
    pub severity: Severity,
    pub expires_at: Instant,
}

/// Pending display messages for every scope.
#[derive(Debug, Default)]
pub struct MessageBoard {
    messages: Vec<DisplayMessage>,
}

impl MessageBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message unless an identical one (same scope, text and severity)
    /// is still pending.
    ///
    /// # Returns
    ///
    /// `true` when the message was added
    pub fn push_unique(
        &mut self,
        scope: MessageScope,
        text: &str,
        severity: Severity,
        ttl: Duration,
        now: Instant,
    ) -> bool {
        self.prune_expired(now);

        let duplicate = self
            .messages
            .iter()
            .any(|m| m.scope == scope && m.text == text && m.severity == severity);
        if duplicate {
            tracing::debug!("Dropping duplicate display message: {}", text);
            return false;
        }

        self.messages.push(DisplayMessage {
            id: Uuid::new_v4(),
            scope,
            text: text.to_string(),
            severity,
            expires_at: now + ttl,
        });
        true
    }

    /// Drop messages whose time-to-live has elapsed.
    pub fn prune_expired(&mut self, now: Instant) -> usize {
        let before = self.messages.len();
        self.messages.retain(|m| m.expires_at > now);
        before - self.messages.len()
    }

    /// Dismiss one message by id.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        before != self.messages.len()
    }

    /// Pending messages for one scope, oldest first.
    pub fn pending(&self, scope: &MessageScope) -> Vec<&DisplayMessage> {
        self.messages.iter().filter(|m| &m.scope == scope).collect()
    }

    /// All pending messages, oldest first.
    pub fn all(&self) -> &[DisplayMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
