//! Detection engine for RunWatch.
//!
//! This crate turns per-frame pose landmarks and audio magnitudes into
//! detection requests:
//! - Hip-centroid tracking with perspective correction ([`geometry`])
//! - Moving-average speed smoothing ([`smoother`])
//! - Zone and grid-cell attribution ([`zones`], [`catalog`])
//! - Threshold and heartbeat emission policy ([`policy`])
//! - Per-cell activity decay for overlays ([`activity`])
//!
//! Everything here is synchronous and free of I/O. The [`Session`] context
//! owns all mutable state and is driven by a single dispatcher.

pub mod activity;
pub mod catalog;
pub mod config;
pub mod error;
pub mod geometry;
pub mod noise;
pub mod policy;
pub mod session;
pub mod smoother;
pub mod trail;
pub mod zones;

pub use activity::{ActivityRecord, ActivityTracker};
pub use catalog::{ZoneCatalog, ZoneEntry};
pub use config::DetectionConfig;
pub use error::{DetectError, DetectResult};
pub use geometry::{FrameGeometry, GeometryNormalizer};
pub use noise::{noise_level, BASELINE_NOISE_LEVEL};
pub use policy::{DetectionPolicy, EmitTrigger, Emission};
pub use session::{DetectionRequest, FrameInput, FrameOutcome, Session};
pub use smoother::{SpeedEstimator, SpeedSmoother};
pub use trail::PathHistory;
pub use zones::{CellId, GridConfig, ResolvedZone, ZoneMapper};
