//! Local alert cues for room messages.

use runwatch_models::{BehaviorStatus, EmergencySummon, StateSnapshot};

/// Vibration pattern (on/off milliseconds) for a non-quiet room state.
pub const STATE_HAPTIC_PATTERN: &[u32] = &[200, 100, 200];

/// Vibration pattern for an emergency summon.
pub const EMERGENCY_HAPTIC_PATTERN: &[u32] = &[500, 200, 500, 200, 500];

/// Audio cue kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    /// Running alert chime
    RunningAlert,
    /// Emergency siren
    Siren,
}

/// One cue for the device.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackCue {
    Haptic(&'static [u32]),
    Sound(Sound),
    /// Full-screen alarm that stays up until dismissed
    AlarmOverlay { zone: String, sender: String },
}

/// Cues for a `STATE` broadcast.
pub fn state_cues(state: &StateSnapshot) -> Vec<FeedbackCue> {
    let mut cues = Vec::new();
    if state.status.is_alert() {
        cues.push(FeedbackCue::Haptic(STATE_HAPTIC_PATTERN));
    }
    if state.status == BehaviorStatus::RunningDetected {
        cues.push(FeedbackCue::Sound(Sound::RunningAlert));
    }
    cues
}

/// Cues for an `EMERGENCY` summon. Independent of the status display.
pub fn emergency_cues(summon: &EmergencySummon) -> Vec<FeedbackCue> {
    vec![
        FeedbackCue::AlarmOverlay {
            zone: summon.zone.clone(),
            sender: summon.sender.clone(),
        },
        FeedbackCue::Haptic(EMERGENCY_HAPTIC_PATTERN),
        FeedbackCue::Sound(Sound::Siren),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(status: BehaviorStatus) -> StateSnapshot {
        StateSnapshot {
            status,
            message: String::new(),
            streak: 0,
            alert_snapshot_url: None,
            zone_name: "stacks".into(),
            movement_speed: 0.0,
            noise_level: 40.0,
            room_id: "default".into(),
        }
    }

    #[test]
    fn test_quiet_is_silent() {
        assert!(state_cues(&state(BehaviorStatus::Quiet)).is_empty());
    }

    #[test]
    fn test_loud_vibrates_only() {
        assert_eq!(
            state_cues(&state(BehaviorStatus::Loud)),
            vec![FeedbackCue::Haptic(&[200, 100, 200])]
        );
    }

    #[test]
    fn test_running_vibrates_and_plays() {
        let cues = state_cues(&state(BehaviorStatus::RunningDetected));
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[1], FeedbackCue::Sound(Sound::RunningAlert));
    }

    #[test]
    fn test_emergency_cues() {
        let summon = EmergencySummon::new("stacks", "front desk");
        let cues = emergency_cues(&summon);
        assert!(matches!(&cues[0], FeedbackCue::AlarmOverlay { zone, .. } if zone == "stacks"));
        assert_eq!(cues[1], FeedbackCue::Haptic(EMERGENCY_HAPTIC_PATTERN));
        assert_eq!(cues[2], FeedbackCue::Sound(Sound::Siren));
    }
}
