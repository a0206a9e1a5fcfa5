//! Room synchronization channel.
//!
//! One persistent duplex connection per joined room. `STATE` broadcasts keep
//! every observer on the same status; `EMERGENCY` summons take a separate,
//! higher-priority path on the receiving side.

mod channel;
mod reconnect;
mod state;
mod transport;

pub use channel::{InboundHandler, SyncChannel};
pub use reconnect::{FixedDelay, ReconnectPolicy};
pub use state::{ConnectionEvent, ConnectionState};
pub use transport::{RoomConnection, RoomTransport, WsTransport};

#[cfg(test)]
pub(crate) use transport::memory;
