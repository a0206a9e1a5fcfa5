//! Reconnect scheduling.

use std::time::Duration;

/// Decides how long to wait before reconnect attempt `attempt` (1-based).
/// `None` stops reconnecting.
pub trait ReconnectPolicy: Send + Sync {
    fn next_delay(&self, attempt: u32) -> Option<Duration>;
}

/// Same delay every time, forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl Default for FixedDelay {
    fn default() -> Self {
        Self(Duration::from_secs(3))
    }
}

impl ReconnectPolicy for FixedDelay {
    fn next_delay(&self, _attempt: u32) -> Option<Duration> {
        Some(self.0)
    }
}
