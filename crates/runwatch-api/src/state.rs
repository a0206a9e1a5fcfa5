//! Application state.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::classify::{RoomRegistry, Thresholds};
use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::hub::RoomHub;
use crate::snapshots::SnapshotStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub rooms: Arc<RoomRegistry>,
    pub hub: Arc<RoomHub>,
    pub snapshots: SnapshotStore,
    /// Current dashboard access code; `None` until one is issued
    pub access_code: Arc<RwLock<Option<String>>>,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> ApiResult<Self> {
        let snapshots = SnapshotStore::open(&config.snapshot_dir, config.snapshot_retention).await?;
        let rooms = RoomRegistry::new(
            Thresholds {
                speed_running: config.speed_threshold_running,
                noise_loud: config.noise_threshold_loud,
            },
            config.alert_hold,
        );

        Ok(Self {
            config,
            rooms: Arc::new(rooms),
            hub: Arc::new(RoomHub::new()),
            snapshots,
            access_code: Arc::new(RwLock::new(None)),
        })
    }
}
