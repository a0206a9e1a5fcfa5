//! Shared data models for RunWatch.
//!
//! This crate provides Serde-serializable types for:
//! - Pose landmarks and normalized frame geometry
//! - Sensor readings and the server's detection results
//! - Zone and room identifiers
//! - Room synchronization messages (state broadcast, emergency summon)
//! - Dashboard, snapshot and admin payloads

pub mod access;
pub mod dashboard;
pub mod geometry;
pub mod reading;
pub mod room;
pub mod snapshot;
pub mod status;
pub mod sync;
pub mod utils;
pub mod zone;

// Re-export common types
pub use access::AccessCodeResponse;
pub use dashboard::{AlertEntry, DashboardStats, ZoneAlerts, ZoneState};
pub use geometry::{BoundingBox, Landmark, LandmarkSet, LandmarkSetError, Point2, PoseLandmark};
pub use reading::{DetectionResult, SensorReading, StateSnapshot};
pub use room::{RoomId, RoomIdError};
pub use snapshot::{SnapshotUpload, SnapshotUploadResponse};
pub use status::BehaviorStatus;
pub use sync::{EmergencySummon, SyncMessage, SyncMessageType};
pub use zone::{ZoneId, ZoneLayout, ZoneNameError};
