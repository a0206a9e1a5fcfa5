//! Reading classification and per-room zone state.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use runwatch_models::{
    AlertEntry, BehaviorStatus, DashboardStats, DetectionResult, SensorReading, ZoneAlerts,
    ZoneState,
};
use tokio::sync::RwLock;

/// Room used when a reading names none.
pub const DEFAULT_ROOM: &str = "default";

/// Shown for alerts that arrive without evidence.
pub const PLACEHOLDER_SNAPSHOT_URL: &str = "/static/logo.png";

/// Alerts kept per zone for `GET /alerts/{zone}`.
const MAX_ALERTS_PER_ZONE: usize = 20;

/// Classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub speed_running: f64,
    pub noise_loud: f64,
}

impl Thresholds {
    /// Running wins over noise.
    pub fn classify(&self, movement_speed: f64, noise_level: f64) -> BehaviorStatus {
        if movement_speed > self.speed_running {
            BehaviorStatus::RunningDetected
        } else if noise_level > self.noise_loud {
            BehaviorStatus::Loud
        } else {
            BehaviorStatus::Quiet
        }
    }
}

fn status_message(status: BehaviorStatus, zone: &str) -> String {
    match status {
        BehaviorStatus::RunningDetected => "Running detected! Please walk for safety.".to_string(),
        BehaviorStatus::Loud => "Noise level is high. Shhh!".to_string(),
        BehaviorStatus::Quiet => format!("Thank you for keeping the {} quiet.", zone),
    }
}

/// Everything the server knows about one room.
#[derive(Debug, Default)]
pub struct RoomContext {
    streaks: HashMap<String, u32>,
    zones: BTreeMap<String, ZoneState>,
    alerts: HashMap<String, VecDeque<AlertEntry>>,
    incidents: u32,
    noise_warnings: u32,
}

impl RoomContext {
    /// Classify a reading and fold it into the room state.
    pub fn record(
        &mut self,
        room_id: &str,
        reading: &SensorReading,
        thresholds: &Thresholds,
        now: DateTime<Utc>,
    ) -> DetectionResult {
        let zone = reading.zone_name.as_str();
        let status = thresholds.classify(reading.movement_speed, reading.noise_level);
        let is_alert = status.is_alert();

        let snapshot_url = match (&reading.alert_snapshot_url, is_alert) {
            (Some(url), _) => Some(url.clone()),
            (None, true) => Some(PLACEHOLDER_SNAPSHOT_URL.to_string()),
            (None, false) => None,
        };

        let streak = self.streaks.entry(zone.to_string()).or_insert(0);
        if is_alert {
            *streak = 0;
        } else {
            *streak += 1;
        }
        let streak = *streak;

        match status {
            BehaviorStatus::RunningDetected => self.incidents += 1,
            BehaviorStatus::Loud => self.noise_warnings += 1,
            BehaviorStatus::Quiet => {}
        }

        let state = self.zones.entry(zone.to_string()).or_insert_with(|| ZoneState {
            name: zone.to_string(),
            status: BehaviorStatus::Quiet,
            events_today: 0,
            last_active: now,
            last_alert_time: None,
            last_alert_status: None,
            noise_level: reading.noise_level,
            movement_speed: reading.movement_speed,
            alert_snapshot_url: None,
        });
        state.status = status;
        state.last_active = now;
        state.noise_level = reading.noise_level;
        state.movement_speed = reading.movement_speed;
        state.alert_snapshot_url = snapshot_url.clone();

        if is_alert {
            state.events_today += 1;
            state.last_alert_time = Some(now);
            state.last_alert_status = Some(status);

            let history = self.alerts.entry(zone.to_string()).or_default();
            history.push_front(AlertEntry {
                status,
                time: now,
                movement_speed: reading.movement_speed,
                noise_level: reading.noise_level,
                snapshot_url: snapshot_url.clone(),
            });
            history.truncate(MAX_ALERTS_PER_ZONE);
        }

        DetectionResult {
            status,
            message: status_message(status, zone),
            streak,
            alert_snapshot_url: snapshot_url,
            zone_name: zone.to_string(),
            movement_speed: reading.movement_speed,
            noise_level: reading.noise_level,
            room_id: room_id.to_string(),
        }
    }

    /// Zone states and totals. A quiet zone keeps showing its last alert
    /// status until `alert_hold` has passed.
    pub fn dashboard(&self, alert_hold: Duration, now: DateTime<Utc>) -> DashboardStats {
        let hold = chrono::Duration::from_std(alert_hold).unwrap_or(chrono::Duration::MAX);

        let zones = self
            .zones
            .values()
            .map(|state| {
                let mut reported = state.clone();
                if state.status == BehaviorStatus::Quiet {
                    if let (Some(at), Some(status)) = (state.last_alert_time, state.last_alert_status) {
                        if now.signed_duration_since(at) < hold {
                            reported.status = status;
                        }
                    }
                }
                reported
            })
            .collect::<Vec<_>>();

        DashboardStats {
            total_zones: zones.len(),
            zones,
            total_incidents: self.incidents,
            total_noise: self.noise_warnings,
        }
    }

    /// Recorded alerts of one zone, newest first.
    pub fn alerts(&self, zone: &str) -> Vec<AlertEntry> {
        self.alerts
            .get(zone)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// All rooms, keyed by room id.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, RoomContext>>,
    thresholds: Thresholds,
    alert_hold: Duration,
}

impl RoomRegistry {
    pub fn new(thresholds: Thresholds, alert_hold: Duration) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            thresholds,
            alert_hold,
        }
    }

    /// Classify a reading in its room (`default` when none is named).
    pub async fn classify(&self, reading: &SensorReading) -> DetectionResult {
        let room_id = reading.room_id.as_deref().unwrap_or(DEFAULT_ROOM);
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room_id.to_string())
            .or_default()
            .record(room_id, reading, &self.thresholds, Utc::now())
    }

    pub async fn dashboard(&self, room_id: &str) -> DashboardStats {
        let rooms = self.rooms.read().await;
        match rooms.get(room_id) {
            Some(room) => room.dashboard(self.alert_hold, Utc::now()),
            None => RoomContext::default().dashboard(self.alert_hold, Utc::now()),
        }
    }

    pub async fn alerts(&self, room_id: &str, zone: &str) -> ZoneAlerts {
        let rooms = self.rooms.read().await;
        ZoneAlerts {
            zone: zone.to_string(),
            alerts: rooms.get(room_id).map(|r| r.alerts(zone)).unwrap_or_default(),
        }
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
