//! RunWatch ingestion and room-sync server.
//!
//! This crate provides:
//! - Reading classification with per-room zone state and dashboards
//! - Snapshot upload, serving and retention
//! - Room sockets relaying state broadcasts and emergency summons
//! - Rate limiting, security headers and Prometheus metrics

pub mod classify;
pub mod config;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod snapshots;
pub mod state;
pub mod ws;

pub use classify::{RoomRegistry, Thresholds};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use hub::RoomHub;
pub use routes::create_router;
pub use snapshots::SnapshotStore;
pub use state::AppState;
