//! Sensor readings and detection results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::status::BehaviorStatus;

/// One report sent by a detection client (`POST /sensor/reading`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct SensorReading {
    /// Effective zone label, including the grid cell suffix in grid mode
    #[validate(length(min = 1, max = 128))]
    pub zone_name: String,

    /// Smoothed movement speed
    #[validate(range(min = 0.0))]
    pub movement_speed: f64,

    /// Noise level in dB-equivalent units
    #[validate(range(min = 0.0))]
    pub noise_level: f64,

    /// URL of an uploaded evidence snapshot
    #[serde(default)]
    pub alert_snapshot_url: Option<String>,

    /// Room the reporting client has joined
    #[serde(default)]
    pub room_id: Option<String>,
}

impl SensorReading {
    /// Create a reading, rounding values the way they are displayed:
    /// speed to one decimal, noise to a whole number.
    pub fn new(zone_name: impl Into<String>, movement_speed: f64, noise_level: f64) -> Self {
        Self {
            zone_name: zone_name.into(),
            movement_speed: (movement_speed * 10.0).round() / 10.0,
            noise_level: noise_level.round(),
            alert_snapshot_url: None,
            room_id: None,
        }
    }

    pub fn with_snapshot(mut self, url: Option<String>) -> Self {
        self.alert_snapshot_url = url;
        self
    }

    pub fn with_room(mut self, room_id: Option<String>) -> Self {
        self.room_id = room_id;
        self
    }
}

/// Server classification of a reading (`POST /sensor/reading` response).
///
/// This is also the payload of a `STATE` sync message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectionResult {
    pub status: BehaviorStatus,
    pub message: String,
    /// Consecutive quiet readings for the zone
    pub streak: u32,
    #[serde(default)]
    pub alert_snapshot_url: Option<String>,
    pub zone_name: String,
    pub movement_speed: f64,
    pub noise_level: f64,
    #[serde(default = "default_room")]
    pub room_id: String,
}

/// Name used by clients for the latest server-confirmed state.
pub type StateSnapshot = DetectionResult;

fn default_room() -> String {
    "default".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_rounding() {
        let reading = SensorReading::new("reading_area", 6.04, 72.6);
        assert_eq!(reading.movement_speed, 6.0);
        assert_eq!(reading.noise_level, 73.0);
    }

    #[test]
    fn test_reading_wire_format() {
        let reading = SensorReading::new("reading_area", 3.2, 41.0)
            .with_room(Some("WATCH-ABC123".into()));
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["zone_name"], "reading_area");
        assert_eq!(json["room_id"], "WATCH-ABC123");
        assert!(json["alert_snapshot_url"].is_null());
    }

    #[test]
    fn test_reading_validation() {
        let reading = SensorReading::new("", 1.0, 40.0);
        assert!(reading.validate().is_err());

        let reading = SensorReading::new("stacks", -1.0, 40.0);
        assert!(reading.validate().is_err());

        let reading = SensorReading::new("stacks", 1.0, 40.0);
        assert!(reading.validate().is_ok());
    }

    #[test]
    fn test_result_defaults_room() {
        let json = r#"{
            "status": "QUIET",
            "message": "ok",
            "streak": 3,
            "zone_name": "stacks",
            "movement_speed": 0.5,
            "noise_level": 42
        }"#;
        let result: DetectionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.room_id, "default");
        assert_eq!(result.alert_snapshot_url, None);
        assert_eq!(result.streak, 3);
    }
}
