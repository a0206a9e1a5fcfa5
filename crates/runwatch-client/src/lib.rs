//! RunWatch detection client.
//!
//! Wires the pure detection [`Session`](runwatch_detect::Session) to the
//! outside world:
//! - [`http`]: ingestion server endpoints
//! - [`sync`]: room channel with automatic reconnect
//! - [`controller`]: the single dispatcher loop
//! - [`feedback`]: local alert cues for room messages

pub mod config;
pub mod controller;
pub mod error;
pub mod feedback;
pub mod http;
pub mod metrics;
pub mod sync;

pub use config::ClientConfig;
pub use controller::{
    AudioSource, Controller, ControllerEvent, ControllerHandle, Notice, SnapshotSource, StatusSink,
};
pub use error::{ClientError, ClientResult};
pub use feedback::{FeedbackCue, Sound};
pub use http::IngestClient;
pub use sync::{ConnectionState, FixedDelay, ReconnectPolicy, SyncChannel};
