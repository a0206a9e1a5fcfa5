//! Snapshot files on local disk.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use runwatch_models::utils::sanitize_file_component;
use runwatch_models::SnapshotUpload;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;

/// URL prefix snapshots are served under.
pub const SNAPSHOT_URL_PREFIX: &str = "/snapshots";

/// Writes uploaded snapshots and sweeps expired ones.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    retention: Duration,
}

impl SnapshotStore {
    /// Create the store, making sure its directory exists.
    pub async fn open(dir: impl Into<PathBuf>, retention: Duration) -> ApiResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir, retention })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decode the data URL and write `{zone}_{unix_ts}.jpg`.
    /// Returns the public URL of the file.
    pub async fn save(&self, upload: &SnapshotUpload) -> ApiResult<String> {
        let (_, payload) = upload
            .data_url_parts()
            .ok_or_else(|| ApiError::bad_request("image must be a base64 data URL"))?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ApiError::bad_request(format!("invalid base64 image: {}", e)))?;

        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let filename = format!("{}_{}.jpg", sanitize_file_component(&upload.zone), ts);

        tokio::fs::write(self.dir.join(&filename), &bytes).await?;
        metrics::record_snapshot_stored(bytes.len());
        info!(zone = %upload.zone, file = %filename, bytes = bytes.len(), "Snapshot stored");

        Ok(format!("{}/{}", SNAPSHOT_URL_PREFIX, filename))
    }

    /// Delete files older than the retention window. Returns how many went.
    pub async fn sweep(&self) -> usize {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Snapshot sweep skipped");
                return 0;
            }
        };

        let mut removed = 0;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let expired = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified.elapsed().is_ok_and(|age| age >= self.retention),
                Err(_) => false,
            };
            if !expired {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => debug!(file = %entry.path().display(), error = %e, "Could not remove snapshot"),
            }
        }

        if removed > 0 {
            info!(removed, "Expired snapshots removed");
            metrics::record_snapshots_pruned(removed);
        }
        removed
    }

    /// Run a sweep in the background.
    pub fn spawn_sweep(&self) {
        let store = self.clone();
        tokio::spawn(async move {
            store.sweep().await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(zone: &str) -> SnapshotUpload {
        SnapshotUpload::new(zone, format!("data:image/jpeg;base64,{}", STANDARD.encode(b"jpeg")))
    }

    #[tokio::test]
    async fn test_save_writes_sanitized_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path(), Duration::from_secs(3600)).await.unwrap();

        let url = store.save(&upload("reading_area (Cam 2)")).await.unwrap();
        assert!(url.starts_with("/snapshots/reading_area__Cam_2__"));
        assert!(url.ends_with(".jpg"));

        let filename = url.trim_start_matches("/snapshots/");
        let bytes = tokio::fs::read(dir.path().join(filename)).await.unwrap();
        assert_eq!(bytes, b"jpeg");
    }

    #[tokio::test]
    async fn test_save_rejects_bad_image() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path(), Duration::from_secs(3600)).await.unwrap();

        let err = store.save(&SnapshotUpload::new("stacks", "not a data url")).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = store
            .save(&SnapshotUpload::new("stacks", "data:image/jpeg;base64,@@@"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_sweep_respects_retention() {
        let dir = tempfile::tempdir().unwrap();
        let keep = SnapshotStore::open(dir.path(), Duration::from_secs(3600)).await.unwrap();
        keep.save(&upload("stacks")).await.unwrap();
        assert_eq!(keep.sweep().await, 0);

        let purge = SnapshotStore::open(dir.path(), Duration::ZERO).await.unwrap();
        assert_eq!(purge.sweep().await, 1);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
