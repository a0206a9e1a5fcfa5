//! Behavior status classification.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Scene classification assigned by the server.
///
/// Clients never compute this locally; they only reflect the latest status
/// they were sent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BehaviorStatus {
    /// Nothing above threshold
    #[default]
    Quiet,
    /// Noise above the loud threshold
    Loud,
    /// Movement speed above the running threshold
    RunningDetected,
}

impl BehaviorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorStatus::Quiet => "QUIET",
            BehaviorStatus::Loud => "LOUD",
            BehaviorStatus::RunningDetected => "RUNNING_DETECTED",
        }
    }

    /// Whether this status counts as an incident.
    pub fn is_alert(&self) -> bool {
        !matches!(self, BehaviorStatus::Quiet)
    }

    /// Human-readable badge text ("RUNNING DETECTED").
    pub fn display_label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl std::fmt::Display for BehaviorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
