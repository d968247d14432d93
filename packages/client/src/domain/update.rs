//! Decoded form of one inbound server push.

use super::{
    entity::{GameMetadata, GameSnapshot},
    value_object::{ConnectionId, GameId, Severity},
};

/// A display notice attached to a server push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerNotice {
    pub text: String,
    pub severity: Severity,
}

impl ServerNotice {
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }
}

/// A game record: the current tip snapshot plus record metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub id: GameId,
    pub metadata: GameMetadata,
    pub snapshot: GameSnapshot,
}

/// One server push, decoded and ready for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerUpdate {
    pub status_code: u16,
    pub connection_id: Option<ConnectionId>,
    pub notices: Vec<ServerNotice>,
    pub game: Option<GameRecord>,
}
