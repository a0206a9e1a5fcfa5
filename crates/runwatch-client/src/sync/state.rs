//! Connection state machine.

use std::fmt;

/// Room connection lifecycle: `Disconnected → Connecting → Open → Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connection attempt begins
    Connect,
    /// The handshake completed
    Opened,
    /// The attempt failed, the peer closed, or the room was left
    Closed,
}

impl ConnectionState {
    /// Next state, or `None` if the event is not valid here.
    pub fn on(self, event: ConnectionEvent) -> Option<ConnectionState> {
        use ConnectionEvent::*;
        use ConnectionState::*;

        match (self, event) {
            (Disconnected, Connect) => Some(Connecting),
            (Connecting, Opened) => Some(Open),
            (Connecting, Closed) | (Open, Closed) => Some(Disconnected),
            (Disconnected, Closed) => Some(Disconnected),
            _ => None,
        }
    }

    pub fn is_open(self) -> bool {
        self == ConnectionState::Open
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
