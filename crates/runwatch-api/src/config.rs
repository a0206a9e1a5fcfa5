//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Zones offered to clients by `GET /api/map/layout` when none are configured.
const DEFAULT_LAYOUT_ZONES: &[&str] = &["reading_area", "quiet_study", "computer_lab"];

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Per-IP requests per second
    pub rate_limit_rps: u32,
    /// Max request body size (snapshots are sent inline)
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Where uploaded snapshots are written
    pub snapshot_dir: PathBuf,
    /// Static assets (alert placeholder image)
    pub static_dir: PathBuf,
    /// Snapshots older than this are swept
    pub snapshot_retention: Duration,
    /// Speed above which a reading is RUNNING_DETECTED
    pub speed_threshold_running: f64,
    /// Noise above which a reading is LOUD
    pub noise_threshold_loud: f64,
    /// How long a quiet zone keeps showing its last alert on the dashboard
    pub alert_hold: Duration,
    /// Zone names served to clients
    pub layout_zones: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 20,
            max_body_size: 10 * 1024 * 1024, // 10MB
            environment: "development".to_string(),
            snapshot_dir: PathBuf::from("snapshots"),
            static_dir: PathBuf::from("static"),
            snapshot_retention: Duration::from_secs(2 * 3600),
            speed_threshold_running: 5.0,
            noise_threshold_loud: 65.0,
            alert_hold: Duration::from_secs(60),
            layout_zones: DEFAULT_LAYOUT_ZONES.iter().map(|z| z.to_string()).collect(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: env_list("CORS_ORIGINS").unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            snapshot_dir: std::env::var("SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_dir),
            static_dir: std::env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            snapshot_retention: env_parse::<u64>("SNAPSHOT_RETENTION_HOURS")
                .map(|h| Duration::from_secs(h * 3600))
                .unwrap_or(defaults.snapshot_retention),
            speed_threshold_running: env_parse("SPEED_THRESHOLD_RUNNING")
                .unwrap_or(defaults.speed_threshold_running),
            noise_threshold_loud: env_parse("NOISE_THRESHOLD_LOUD")
                .unwrap_or(defaults.noise_threshold_loud),
            alert_hold: env_parse("ALERT_HOLD_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.alert_hold),
            layout_zones: env_list("LAYOUT_ZONES").unwrap_or(defaults.layout_zones),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn env_list(key: &str) -> Option<Vec<String>> {
    let list: Vec<String> = std::env::var(key)
        .ok()?
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!list.is_empty()).then_some(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.speed_threshold_running, 5.0);
        assert_eq!(config.noise_threshold_loud, 65.0);
        assert_eq!(config.alert_hold, Duration::from_secs(60));
        assert_eq!(config.snapshot_retention, Duration::from_secs(7200));
        assert!(!config.is_production());
    }
}
