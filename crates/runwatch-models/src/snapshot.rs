//! Evidence snapshot upload payloads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `POST /upload/snapshot` request.
#[derive(Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SnapshotUpload {
    pub zone: String,
    /// Encoded still frame as a data URL (`data:image/jpeg;base64,...`)
    pub image: String,
}

impl SnapshotUpload {
    pub fn new(zone: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            image: image.into(),
        }
    }

    /// Split the data URL into its header and base64 payload.
    pub fn data_url_parts(&self) -> Option<(&str, &str)> {
        let (header, payload) = self.image.split_once(',')?;
        if !header.starts_with("data:") || payload.is_empty() {
            return None;
        }
        Some((header, payload))
    }
}

// Image payloads are large; print their size only.
impl std::fmt::Debug for SnapshotUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotUpload")
            .field("zone", &self.zone)
            .field("image_len", &self.image.len())
            .finish()
    }
}

/// `POST /upload/snapshot` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SnapshotUploadResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_parts() {
        let upload = SnapshotUpload::new("stacks", "data:image/jpeg;base64,QUJD");
        assert_eq!(upload.data_url_parts(), Some(("data:image/jpeg;base64", "QUJD")));

        let bad = SnapshotUpload::new("stacks", "QUJD");
        assert_eq!(bad.data_url_parts(), None);

        let empty = SnapshotUpload::new("stacks", "data:image/jpeg;base64,");
        assert_eq!(empty.data_url_parts(), None);
    }
}
