//! Client configuration.

use std::time::Duration;

use runwatch_detect::DetectionConfig;
use runwatch_models::RoomId;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Detection client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the ingestion server
    pub server_url: Url,
    /// Room to join at startup
    pub room: Option<RoomId>,
    /// Delay before reconnecting a dropped room channel
    pub reconnect_delay: Duration,
    /// HTTP request timeout
    pub timeout: Duration,
    /// HTTP connect timeout
    pub connect_timeout: Duration,
    /// Detection pipeline settings
    pub detection: DetectionConfig,
}

impl ClientConfig {
    pub fn new(server_url: Url) -> Self {
        Self {
            server_url,
            room: None,
            reconnect_delay: Duration::from_secs(3),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            detection: DetectionConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        let server_url = std::env::var("RUNWATCH_SERVER_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
        let server_url = Url::parse(&server_url)?;

        let room = match std::env::var("RUNWATCH_ROOM") {
            Ok(code) if !code.trim().is_empty() => Some(RoomId::parse(&code)?),
            _ => None,
        };

        let reconnect_secs: u64 = std::env::var("RUNWATCH_RECONNECT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3);

        let timeout_secs: u64 = std::env::var("RUNWATCH_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let connect_timeout_secs: u64 = std::env::var("RUNWATCH_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let detection = DetectionConfig::from_env();
        detection.validate()?;

        Ok(Self {
            server_url,
            room,
            reconnect_delay: Duration::from_secs(reconnect_secs),
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            detection,
        })
    }

    /// Absolute URL for an API path on the ingestion server.
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.server_url.join(path)?)
    }
}

/// Room channel URL: `ws(s)://host/ws/{room}`, scheme following the server's.
pub fn room_url(server_url: &Url, room: &RoomId) -> ClientResult<Url> {
    let mut url = server_url.join(&format!("ws/{}", urlencoding::encode(room.as_str())))?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|_| ClientError::request_failed(format!("cannot use {} for a room channel", url)))?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_url_scheme() {
        let room = RoomId::parse("WATCH-ABC123").unwrap();

        let url = room_url(&Url::parse("http://localhost:8000").unwrap(), &room).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8000/ws/WATCH-ABC123");

        let url = room_url(&Url::parse("https://watch.example.org/").unwrap(), &room).unwrap();
        assert_eq!(url.as_str(), "wss://watch.example.org/ws/WATCH-ABC123");
    }

    #[test]
    fn test_room_url_encodes_code() {
        let room = RoomId::parse("front desk/1").unwrap();
        let url = room_url(&Url::parse("http://localhost:8000").unwrap(), &room).unwrap();
        assert_eq!(url.path(), "/ws/front%20desk%2F1");
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(Url::parse("http://localhost:8000").unwrap());
        assert_eq!(config.reconnect_delay, Duration::from_secs(3));
        assert_eq!(
            config.endpoint("/sensor/reading").unwrap().as_str(),
            "http://localhost:8000/sensor/reading"
        );
    }
}
