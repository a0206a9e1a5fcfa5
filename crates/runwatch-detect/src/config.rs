//! Detection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, DetectResult};
use crate::zones::GridConfig;

/// Tunables for the detection pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Noise level above which a tick reports immediately
    pub noise_threshold: f64,
    /// Smoothed speed above which a tick or frame reports immediately
    pub speed_threshold: f64,
    /// Ticks without a report before a heartbeat report is forced
    pub heartbeat_ticks: u32,
    /// Detection tick period
    pub tick_interval: Duration,
    /// Minimum age of the previous report before the frame path may report
    pub frame_emit_min_interval: Duration,
    /// Moving-average window for speed samples
    pub speed_buffer_size: usize,
    /// Centroid trail length kept for overlays
    pub path_history_size: usize,
    /// Fixed gain applied to instantaneous speed
    pub speed_gain: f64,
    /// Window over which a grid cell's activity fades out
    pub activity_fade: Duration,
    /// Zone selected at startup
    pub default_zone: String,
    /// Grid subdivision
    pub grid: GridConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            noise_threshold: 75.0,
            speed_threshold: 10.0,
            heartbeat_ticks: 4,
            tick_interval: Duration::from_millis(500),
            frame_emit_min_interval: Duration::from_millis(500),
            speed_buffer_size: 5,
            path_history_size: 15,
            speed_gain: 5.0,
            activity_fade: Duration::from_millis(3000),
            default_zone: "reading_area".to_string(),
            grid: GridConfig::default(),
        }
    }
}

impl DetectionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            noise_threshold: env_parse("RUNWATCH_NOISE_THRESHOLD").unwrap_or(defaults.noise_threshold),
            speed_threshold: env_parse("RUNWATCH_SPEED_THRESHOLD").unwrap_or(defaults.speed_threshold),
            heartbeat_ticks: env_parse("RUNWATCH_HEARTBEAT_TICKS").unwrap_or(defaults.heartbeat_ticks),
            tick_interval: env_parse("RUNWATCH_TICK_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            frame_emit_min_interval: env_parse("RUNWATCH_FRAME_EMIT_MIN_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.frame_emit_min_interval),
            default_zone: std::env::var("RUNWATCH_ZONE").unwrap_or(defaults.default_zone),
            grid: GridConfig {
                enabled: env_parse("RUNWATCH_GRID_ENABLED").unwrap_or(defaults.grid.enabled),
                rows: env_parse("RUNWATCH_GRID_ROWS").unwrap_or(defaults.grid.rows),
                cols: env_parse("RUNWATCH_GRID_COLS").unwrap_or(defaults.grid.cols),
            },
            ..defaults
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> DetectResult<()> {
        self.grid.validate()?;
        if self.heartbeat_ticks == 0 {
            return Err(DetectError::invalid_config("heartbeat_ticks must be at least 1"));
        }
        if self.speed_buffer_size == 0 {
            return Err(DetectError::invalid_config("speed_buffer_size must be at least 1"));
        }
        if self.tick_interval.is_zero() {
            return Err(DetectError::invalid_config("tick_interval must be non-zero"));
        }
        if !self.noise_threshold.is_finite() || !self.speed_threshold.is_finite() {
            return Err(DetectError::invalid_config("thresholds must be finite"));
        }
        Ok(())
    }

    /// Longest possible gap between two tick reports.
    pub fn max_report_gap(&self) -> Duration {
        self.tick_interval * self.heartbeat_ticks
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
