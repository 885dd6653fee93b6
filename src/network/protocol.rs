//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! All messages are JSON objects tagged by a `"type"` field.

use std::collections::BTreeMap;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Deserialize};

use crate::game::board::BoardConfig;
use crate::game::error::GameError;
use crate::game::snapshot::{GameState, PlayerPosition, ScoreEntry};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Claim a player name.
    Register { name: String },

    /// Move one step: `"U"`, `"D"`, `"L"` or `"R"`.
    ///
    /// Kept as a raw string so unknown codes can be ignored rather than
    /// rejected as malformed.
    Move { direction: String },

    /// Request current game state.
    SyncRequest,

    /// Ping for latency measurement.
    Ping { timestamp: u64 },
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Registration accepted.
    Welcome { player_id: u32, name: String },

    /// Registration rejected.
    BadName { name: String, reason: NameRejection },

    /// Full game state.
    State(GameStateUpdate),

    /// Game event notification.
    Event(GameEvent),

    /// Pong response.
    Pong { timestamp: u64, server_time: u64 },

    /// Error message.
    Error(ServerError),

    /// Server is shutting down.
    Shutdown { reason: String },
}

/// Why a name was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameRejection {
    /// Empty or too long.
    InvalidName,
    /// Already registered.
    NameTaken,
}

impl NameRejection {
    /// Map a registration error to its wire reason.
    pub fn from_error(error: &GameError) -> Option<Self> {
        match error {
            GameError::InvalidName => Some(NameRejection::InvalidName),
            GameError::NameTaken(_) => Some(NameRejection::NameTaken),
            _ => None,
        }
    }
}

/// Game state broadcast after every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateUpdate {
    /// Board columns.
    pub width: u16,
    /// Board rows.
    pub height: u16,
    /// Player positions in registration order.
    pub positions: Vec<PlayerPosition>,
    /// Leaderboard, highest score first.
    pub scores: Vec<ScoreEntry>,
    /// `"row,col"` -> coin value.
    pub coins: BTreeMap<String, u32>,
    /// RFC 3339 timestamp of the snapshot.
    pub generated_at: String,
}

impl GameStateUpdate {
    /// Wrap a snapshot for the wire.
    pub fn new(board: &BoardConfig, state: GameState, generated_at: DateTime<Utc>) -> Self {
        Self {
            width: board.width,
            height: board.height,
            positions: state.positions,
            scores: state.scores,
            coins: state.coins,
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Game events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// A new player joined.
    PlayerJoined { name: String },

    /// A player picked up a coin.
    CoinCollected {
        name: String,
        position: String,
        value: u32,
        score: u32,
    },

    /// The field emptied and a fresh batch was laid out.
    CoinsRepopulated { count: u32 },
}

/// Server error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Message could not be parsed.
    InvalidInput,
    /// Session already owns a player.
    AlreadyRegistered,
    /// Server at connection capacity.
    ServerOverloaded,
    /// Internal error.
    InternalError,
}

/// Trim surrounding whitespace from a requested name.
pub fn normalize_name(raw: &str) -> &str {
    raw.trim()
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Build an error message.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error(ServerError {
            code,
            message: message.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_client_messages() {
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"register","name":" alice "}"#).unwrap(),
            ClientMessage::Register { name: " alice ".to_string() }
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"move","direction":"L"}"#).unwrap(),
            ClientMessage::Move { direction: "L".to_string() }
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"sync_request"}"#).unwrap(),
            ClientMessage::SyncRequest
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"ping","timestamp":42}"#).unwrap(),
            ClientMessage::Ping { timestamp: 42 }
        );
    }

    #[test]
    fn test_garbled_direction_still_parses() {
        let msg = ClientMessage::from_json(r#"{"type":"move","direction":"sideways"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Move { direction: "sideways".to_string() });
    }

    #[test]
    fn test_unknown_message_type_rejected() {
        assert!(ClientMessage::from_json(r#"{"type":"teleport","row":1}"#).is_err());
        assert!(ClientMessage::from_json("not json").is_err());
    }

    #[test]
    fn test_bad_name_wire_format() {
        let msg = ServerMessage::BadName {
            name: "alice".to_string(),
            reason: NameRejection::NameTaken,
        };
        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""type":"bad_name""#));
        assert!(json.contains(r#""reason":"name_taken""#));
    }

    #[test]
    fn test_name_rejection_mapping() {
        assert_eq!(
            NameRejection::from_error(&GameError::InvalidName),
            Some(NameRejection::InvalidName)
        );
        assert_eq!(
            NameRejection::from_error(&GameError::NameTaken("a".into())),
            Some(NameRejection::NameTaken)
        );
        assert_eq!(NameRejection::from_error(&GameError::UnknownPlayer("a".into())), None);
    }

    #[test]
    fn test_state_update_wire_format() {
        let mut coins = BTreeMap::new();
        coins.insert("3,4".to_string(), 10);
        let state = GameState {
            positions: vec![PlayerPosition { name: "a".into(), position: "1,1".into() }],
            scores: vec![ScoreEntry { name: "a".into(), score: 2 }],
            coins,
        };
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let update = GameStateUpdate::new(&BoardConfig::default(), state, at);

        let json: serde_json::Value =
            serde_json::from_str(&ServerMessage::State(update).to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["width"], 64);
        assert_eq!(json["coins"]["3,4"], 10);
        assert_eq!(json["generated_at"], "2024-01-02T03:04:05.000Z");
    }

    #[test]
    fn test_event_wire_format() {
        let msg = ServerMessage::Event(GameEvent::CoinCollected {
            name: "a".into(),
            position: "10,10".into(),
            value: 5,
            score: 5,
        });
        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""type":"event""#));
        assert!(json.contains(r#""event":"coin_collected""#));
        assert_eq!(ServerMessage::from_json(&json).unwrap(), msg);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  bob\t"), "bob");
        assert_eq!(normalize_name("   "), "");
    }
}
