//! Error types for detection configuration and zone management.

use runwatch_models::ZoneNameError;
use thiserror::Error;

/// Result type for detection operations.
pub type DetectResult<T> = Result<T, DetectError>;

/// Errors raised synchronously by configuration and zone operations.
///
/// The per-frame and per-tick paths never fail; they degrade instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectError {
    #[error("Invalid grid {rows}x{cols}: rows and columns must be at least 1")]
    InvalidGrid { rows: u32, cols: u32 },

    #[error("{0}")]
    InvalidZoneName(#[from] ZoneNameError),

    #[error("This zone already exists: {0}")]
    DuplicateZone(String),

    #[error("Unknown zone: {0}")]
    UnknownZone(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DetectError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
