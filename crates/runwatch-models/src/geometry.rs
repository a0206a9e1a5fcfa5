//! Pose landmarks and normalized frame geometry.
//!
//! All coordinates are normalized to the frame: (0.0, 0.0) is the top-left
//! corner and (1.0, 1.0) the bottom-right.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of joints in a full-body pose estimate.
pub const POSE_LANDMARK_COUNT: usize = 33;

/// Joints the detection pipeline reads (full-body 33-point topology).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum PoseLandmark {
    Nose = 0,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftHip = 23,
    RightHip = 24,
}

impl PoseLandmark {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A point in normalized frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(&self, other: &Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A single skeletal joint from the pose estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    /// Detection confidence, opaque to the pipeline
    #[serde(default)]
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            visibility: 1.0,
        }
    }

    pub fn point(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Rejected landmark set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected} pose landmarks, got {got}")]
pub struct LandmarkSetError {
    pub expected: usize,
    pub got: usize,
}

/// A complete per-frame pose estimate.
///
/// Construction guarantees at least [`POSE_LANDMARK_COUNT`] joints, so
/// indexed access by [`PoseLandmark`] never fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct LandmarkSet(Vec<Landmark>);

impl LandmarkSet {
    pub fn new(landmarks: Vec<Landmark>) -> Result<Self, LandmarkSetError> {
        if landmarks.len() < POSE_LANDMARK_COUNT {
            return Err(LandmarkSetError {
                expected: POSE_LANDMARK_COUNT,
                got: landmarks.len(),
            });
        }
        Ok(Self(landmarks))
    }

    pub fn get(&self, joint: PoseLandmark) -> &Landmark {
        &self.0[joint.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<Landmark>> for LandmarkSet {
    type Error = LandmarkSetError;

    fn try_from(value: Vec<Landmark>) -> Result<Self, Self::Error> {
        LandmarkSet::new(value)
    }
}

impl From<LandmarkSet> for Vec<Landmark> {
    fn from(value: LandmarkSet) -> Self {
        value.0
    }
}

/// Axis-aligned box in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    /// X coordinate of the top-left corner (0.0 = left, 1.0 = right)
    pub x: f64,
    /// Y coordinate of the top-left corner (0.0 = top, 1.0 = bottom)
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from corner coordinates.
    pub fn from_corners(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Check if the box lies within the frame.
    pub fn is_valid(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width >= 0.0
            && self.height >= 0.0
            && self.max_x() <= 1.001 // Allow small epsilon for float precision
            && self.max_y() <= 1.001
    }
}
