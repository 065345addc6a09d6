//! Bot status and lifecycle event types

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::gateway::BotIdentity;

/// Where the managed bot is in its lifecycle
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BotPhase {
    /// No session is owned
    #[default]
    Idle,
    /// Session spawned, handshake in progress
    Starting,
    /// Handshake complete
    Connected,
    /// Stop requested, waiting for the session to end
    Stopping,
}

impl BotPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Connected => "connected",
            Self::Stopping => "stopping",
        }
    }
}

/// Snapshot returned by `BotManager::status`
///
/// `info` serializes as `{}` when no identity is known, so clients can
/// always index into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotStatus {
    pub running: bool,
    #[serde(serialize_with = "serialize_info", deserialize_with = "deserialize_info")]
    pub info: Option<BotIdentity>,
    pub has_token: bool,
    #[serde(default)]
    pub phase: BotPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

fn serialize_info<S: Serializer>(info: &Option<BotIdentity>, serializer: S) -> Result<S::Ok, S::Error> {
    match info {
        Some(identity) => identity.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

#[derive(Deserialize)]
struct Empty {}

#[derive(Deserialize)]
#[serde(untagged)]
enum InfoRepr {
    Identity(BotIdentity),
    Empty(Empty),
}

fn deserialize_info<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<BotIdentity>, D::Error> {
    Ok(match InfoRepr::deserialize(deserializer)? {
        InfoRepr::Identity(identity) => Some(identity),
        InfoRepr::Empty(_) => None,
    })
}

/// Events emitted by the bot manager
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A session was spawned
    Starting { session_id: String },
    /// The handshake completed
    Connected { name: String, guilds: usize },
    /// The session ended without being asked to
    Disconnected { reason: String },
    /// The session was stopped by its owner
    Stopped { graceful: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_status_has_empty_info_object() {
        let status = BotStatus {
            running: false,
            info: None,
            has_token: false,
            phase: BotPhase::Idle,
            last_error: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "running": false,
                "info": {},
                "has_token": false,
                "phase": "idle"
            })
        );
    }

    #[test]
    fn connected_status_round_trips() {
        let status = BotStatus {
            running: true,
            info: Some(BotIdentity::new("Helper#0420", "42", 3, 120)),
            has_token: true,
            phase: BotPhase::Connected,
            last_error: None,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains(r#""info":{"name":"Helper#0420","id":"42","guilds":3,"users":120}"#));
        let back: BotStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }

    #[test]
    fn minimal_payload_deserializes() {
        let status: BotStatus =
            serde_json::from_str(r#"{"running":false,"info":{},"has_token":true}"#).unwrap();
        assert_eq!(status.info, None);
        assert!(status.has_token);
        assert_eq!(status.phase, BotPhase::Idle);
    }

    #[test]
    fn event_serialization() {
        let event = LifecycleEvent::Stopped { graceful: true };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"stopped","graceful":true}"#);
    }
}
