//! Dashboard views of a room.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::status::BehaviorStatus;

/// Latest known state of one zone inside a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ZoneState {
    pub name: String,
    pub status: BehaviorStatus,
    /// Alerts raised in this zone since the server started
    pub events_today: u32,
    pub last_active: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_alert_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_alert_status: Option<BehaviorStatus>,
    pub noise_level: f64,
    pub movement_speed: f64,
    #[serde(default)]
    pub alert_snapshot_url: Option<String>,
}

/// `GET /api/rooms/{room_id}/dashboard` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DashboardStats {
    pub zones: Vec<ZoneState>,
    pub total_zones: usize,
    pub total_incidents: u32,
    pub total_noise: u32,
}

/// One recorded alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AlertEntry {
    pub status: BehaviorStatus,
    pub time: DateTime<Utc>,
    pub movement_speed: f64,
    pub noise_level: f64,
    #[serde(default)]
    pub snapshot_url: Option<String>,
}

/// `GET /alerts/{zone}` response, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ZoneAlerts {
    pub zone: String,
    pub alerts: Vec<AlertEntry>,
}
