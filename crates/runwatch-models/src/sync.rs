//! Room synchronization message types.
//!
//! Every participant of a room receives the same stream of messages: state
//! snapshots produced by the server and emergency summons sent by any
//! participant.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::reading::StateSnapshot;

/// Sync message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncMessageType {
    /// Latest server classification
    State,
    /// High-priority summon, outside the status flow
    Emergency,
}

impl SyncMessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMessageType::State => "STATE",
            SyncMessageType::Emergency => "EMERGENCY",
        }
    }
}

/// An emergency summon raised by a room participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmergencySummon {
    /// Zone the summon refers to
    pub zone: String,
    /// When the summon was raised
    pub time: DateTime<Utc>,
    /// Display name of the sender
    pub sender: String,
}

impl EmergencySummon {
    pub fn new(zone: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            time: Utc::now(),
            sender: sender.into(),
        }
    }
}

/// Sync message envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncMessage {
    State(StateSnapshot),
    Emergency(EmergencySummon),
}

impl SyncMessage {
    pub fn state(snapshot: StateSnapshot) -> Self {
        SyncMessage::State(snapshot)
    }

    pub fn emergency(zone: impl Into<String>, sender: impl Into<String>) -> Self {
        SyncMessage::Emergency(EmergencySummon::new(zone, sender))
    }

    /// Get the message type.
    pub fn message_type(&self) -> SyncMessageType {
        match self {
            SyncMessage::State(_) => SyncMessageType::State,
            SyncMessage::Emergency(_) => SyncMessageType::Emergency,
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode a text frame.
    ///
    /// Untagged frames holding a bare detection result are accepted as
    /// `STATE`; older servers broadcast results without the envelope.
    pub fn decode(text: &str) -> serde_json::Result<Self> {
        match serde_json::from_str::<SyncMessage>(text) {
            Ok(msg) => Ok(msg),
            Err(tagged_err) => match serde_json::from_str::<StateSnapshot>(text) {
                Ok(snapshot) => Ok(SyncMessage::State(snapshot)),
                Err(_) => Err(tagged_err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::BehaviorStatus;

    fn snapshot() -> StateSnapshot {
        StateSnapshot {
            status: BehaviorStatus::Loud,
            message: "Noise level is high. Shhh!".into(),
            streak: 0,
            alert_snapshot_url: Some("/snapshots/a.jpg".into()),
            zone_name: "reading_area".into(),
            movement_speed: 1.5,
            noise_level: 80.0,
            room_id: "WATCH-XYZ".into(),
        }
    }

    #[test]
    fn test_state_message_is_flat() {
        let json = SyncMessage::state(snapshot()).encode().unwrap();
        assert!(json.contains("\"type\":\"STATE\""));
        assert!(json.contains("\"status\":\"LOUD\""));
        assert!(json.contains("\"zone_name\":\"reading_area\""));
    }

    #[test]
    fn test_emergency_message() {
        let msg = SyncMessage::emergency("stacks", "front desk");
        assert_eq!(msg.message_type(), SyncMessageType::Emergency);
        let json = msg.encode().unwrap();
        assert!(json.contains("\"type\":\"EMERGENCY\""));
        assert!(json.contains("\"sender\":\"front desk\""));

        let back = SyncMessage::decode(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_decode_accepts_bare_result() {
        let bare = serde_json::to_string(&snapshot()).unwrap();
        let msg = SyncMessage::decode(&bare).unwrap();
        assert_eq!(msg, SyncMessage::State(snapshot()));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(SyncMessage::decode("{\"type\":\"PING\"}").is_err());
        assert!(SyncMessage::decode("not json").is_err());
    }
}
