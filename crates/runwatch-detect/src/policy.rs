//! Report timing.
//!
//! The policy only decides *when* a reading is sent. Status is assigned by
//! the server and never computed here.

use std::time::Duration;

use tracing::trace;

use crate::config::DetectionConfig;

/// What caused an emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitTrigger {
    /// A tick saw noise or speed above threshold
    Threshold,
    /// A tick forced a report after the heartbeat interval
    Heartbeat,
    /// A frame saw speed above threshold
    Frame,
}

impl EmitTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::Heartbeat => "heartbeat",
            Self::Frame => "frame",
        }
    }
}

/// A decision to report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emission {
    pub trigger: EmitTrigger,
    pub speed: f64,
    pub noise: f64,
    /// Evidence snapshot wanted (threshold and frame triggers only)
    pub attach_snapshot: bool,
}

/// Threshold-and-heartbeat emission policy.
#[derive(Debug, Clone)]
pub struct DetectionPolicy {
    noise_threshold: f64,
    speed_threshold: f64,
    heartbeat_ticks: u32,
    frame_emit_min_interval: Duration,
    ticks_since_emit: u32,
    last_emit_at: Option<Duration>,
}

impl DetectionPolicy {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            noise_threshold: config.noise_threshold,
            speed_threshold: config.speed_threshold,
            heartbeat_ticks: config.heartbeat_ticks,
            frame_emit_min_interval: config.frame_emit_min_interval,
            ticks_since_emit: 0,
            last_emit_at: None,
        }
    }

    /// Evaluate one detection tick.
    ///
    /// Emits when noise or speed exceeds its threshold, or when this is the
    /// `heartbeat_ticks`-th tick since the last tick emission.
    pub fn on_tick(&mut self, speed: f64, noise: f64, now: Duration) -> Option<Emission> {
        self.ticks_since_emit += 1;

        let over_threshold = self.over_threshold(speed, noise);
        let heartbeat_due = self.ticks_since_emit >= self.heartbeat_ticks;
        if !over_threshold && !heartbeat_due {
            return None;
        }

        self.ticks_since_emit = 0;
        self.last_emit_at = Some(now);

        let trigger = if over_threshold {
            EmitTrigger::Threshold
        } else {
            EmitTrigger::Heartbeat
        };
        trace!(trigger = trigger.as_str(), speed, noise, "Tick emission");

        Some(Emission {
            trigger,
            speed,
            noise,
            attach_snapshot: over_threshold,
        })
    }

    /// Evaluate one frame's smoothed speed.
    ///
    /// Emits when speed exceeds the threshold and the previous emission from
    /// either path is at least `frame_emit_min_interval` old. Does not touch
    /// the heartbeat counter.
    pub fn on_frame(&mut self, speed: f64, noise: f64, now: Duration) -> Option<Emission> {
        if speed <= self.speed_threshold {
            return None;
        }

        if let Some(last) = self.last_emit_at {
            if now.saturating_sub(last) < self.frame_emit_min_interval {
                trace!(speed, "Frame emission suppressed, recent report");
                return None;
            }
        }

        self.last_emit_at = Some(now);
        Some(Emission {
            trigger: EmitTrigger::Frame,
            speed,
            noise,
            attach_snapshot: true,
        })
    }

    pub fn ticks_since_emit(&self) -> u32 {
        self.ticks_since_emit
    }

    pub fn reset(&mut self) {
        self.ticks_since_emit = 0;
        self.last_emit_at = None;
    }

    fn over_threshold(&self, speed: f64, noise: f64) -> bool {
        noise > self.noise_threshold || speed > self.speed_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn policy() -> DetectionPolicy {
        DetectionPolicy::new(&DetectionConfig::default())
    }

    #[test]
    fn test_heartbeat_on_fourth_quiet_tick() {
        let mut policy = policy();
        let mut emitted_at = Vec::new();
        for tick in 1..=12u64 {
            if let Some(e) = policy.on_tick(1.0, 45.0, ms(tick * 500)) {
                assert_eq!(e.trigger, EmitTrigger::Heartbeat);
                assert!(!e.attach_snapshot);
                emitted_at.push(tick);
            }
        }
        assert_eq!(emitted_at, vec![4, 8, 12]);
    }

    #[test]
    fn test_noise_threshold_emits_with_snapshot() {
        let mut policy = policy();
        let e = policy.on_tick(0.0, 80.0, ms(500)).unwrap();
        assert_eq!(e.trigger, EmitTrigger::Threshold);
        assert!(e.attach_snapshot);
        assert_eq!(policy.ticks_since_emit(), 0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut policy = policy();
        assert!(policy.on_tick(10.0, 75.0, ms(500)).is_none());
    }

    #[test]
    fn test_smoothed_six_below_eight_no_threshold_emission() {
        let config = DetectionConfig {
            speed_threshold: 8.0,
            ..Default::default()
        };
        let mut policy = DetectionPolicy::new(&config);
        assert!(policy.on_tick(6.0, 40.0, ms(500)).is_none());
        assert!(policy.on_frame(6.0, 40.0, ms(510)).is_none());
    }

    #[test]
    fn test_threshold_restarts_heartbeat_count() {
        let mut policy = policy();
        policy.on_tick(0.0, 40.0, ms(500));
        policy.on_tick(0.0, 40.0, ms(1000));
        assert!(policy.on_tick(20.0, 40.0, ms(1500)).is_some());
        assert!(policy.on_tick(0.0, 40.0, ms(2000)).is_none());
        assert!(policy.on_tick(0.0, 40.0, ms(2500)).is_none());
        assert!(policy.on_tick(0.0, 40.0, ms(3000)).is_none());
        assert_eq!(
            policy.on_tick(0.0, 40.0, ms(3500)).unwrap().trigger,
            EmitTrigger::Heartbeat
        );
    }

    #[test]
    fn test_frame_emission_rate_limited() {
        let mut policy = policy();
        let e = policy.on_frame(12.0, 50.0, ms(1000)).unwrap();
        assert_eq!(e.trigger, EmitTrigger::Frame);
        assert!(e.attach_snapshot);

        assert!(policy.on_frame(12.0, 50.0, ms(1033)).is_none());
        assert!(policy.on_frame(12.0, 50.0, ms(1499)).is_none());
        assert!(policy.on_frame(12.0, 50.0, ms(1500)).is_some());
    }

    #[test]
    fn test_frame_suppressed_after_tick_emission() {
        let mut policy = policy();
        assert!(policy.on_tick(12.0, 40.0, ms(500)).is_some());
        assert!(policy.on_frame(12.0, 40.0, ms(700)).is_none());
        assert!(policy.on_frame(12.0, 40.0, ms(1000)).is_some());
    }

    #[test]
    fn test_frame_emission_keeps_tick_rule() {
        let mut policy = policy();
        assert!(policy.on_frame(12.0, 40.0, ms(100)).is_some());
        // Tick rule is unchanged by frame emissions
        assert!(policy.on_tick(12.0, 40.0, ms(500)).is_some());
    }
}
