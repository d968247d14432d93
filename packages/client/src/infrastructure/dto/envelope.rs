//! Inbound and outbound envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::game::GameRecordDto;
use crate::domain::{ConnectionId, PlayerAction, ServerNotice, ServerUpdate, Severity};

/// Display message as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessageDto {
    pub message: String,
    pub message_type: Severity,
}

/// One server push.
///
/// `data` is kept as raw JSON until a consumer asks for the game record, so
/// an unexpected payload shape never costs the rest of the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEnvelope {
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub connection_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<ServerMessageDto>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl InboundEnvelope {
    /// Parse a text frame.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Connection identity carried by this envelope, if any.
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection_id
            .clone()
            .and_then(|id| ConnectionId::new(id).ok())
    }

    /// True when `data` is a game record (an object keyed by a game id).
    pub fn has_game_record(&self) -> bool {
        self.data
            .as_ref()
            .and_then(Value::as_object)
            .is_some_and(|object| object.contains_key("gameId") || object.contains_key("game_id"))
    }

    /// Parse `data` as a game record.
    ///
    /// # Returns
    ///
    /// `None` when `data` is absent or carries no game id
    pub fn game_record(&self) -> Option<Result<GameRecordDto, serde_json::Error>> {
        if !self.has_game_record() {
            return None;
        }
        let data = self.data.clone()?;
        Some(serde_json::from_value(data))
    }

    /// Decode the envelope into a [`ServerUpdate`].
    ///
    /// A malformed game record is logged and dropped; notices are kept.
    pub fn into_update(self) -> ServerUpdate {
        let game = match self.game_record() {
            None => None,
            Some(Err(e)) => {
                tracing::warn!("Dropping malformed game record: {}", e);
                None
            }
            Some(Ok(record)) => match record.into_domain() {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Dropping undecodable game record: {}", e);
                    None
                }
            },
        };

        ServerUpdate {
            status_code: self.status_code,
            connection_id: self.connection_id(),
            notices: self
                .messages
                .into_iter()
                .map(|m| ServerNotice::new(m.message, m.message_type))
                .collect(),
            game,
        }
    }
}

/// Outbound frame: a fixed route tag plus one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    pub route: String,
    pub data: PlayerAction,
}

impl OutboundEnvelope {
    pub fn new(route: impl Into<String>, data: PlayerAction) -> Self {
        Self {
            route: route.into(),
            data,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
