//! Tracking point, perspective correction and bounding box.
//!
//! The hip midpoint is used as the tracking point because it is the most
//! stable joint under arm and leg motion. Torso height (shoulder midpoint to
//! hip midpoint) is a proxy for distance to the camera: a subject farther
//! away covers fewer normalized units for the same physical displacement.

use runwatch_models::{BoundingBox, LandmarkSet, Point2, PoseLandmark};

/// Torso height treated as the reference distance.
pub const REFERENCE_TORSO_HEIGHT: f64 = 0.3;

/// Floor applied to torso height before dividing by it.
pub const MIN_TORSO_HEIGHT: f64 = 0.05;

/// Factor for any torso at or below [`MIN_TORSO_HEIGHT`].
pub const MAX_PERSPECTIVE_FACTOR: f64 = 6.0;

/// Padding added on each side of the bounding box, as a fraction of its span.
pub const BOX_PADDING: f64 = 0.1;

/// Geometry derived from one frame's landmarks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    pub centroid: Point2,
    /// Unfloored |hip.y - shoulder.y|
    pub torso_height: f64,
    pub perspective_factor: f64,
    pub bounding_box: BoundingBox,
}

/// Computes [`FrameGeometry`] from a landmark set.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryNormalizer;

impl GeometryNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, landmarks: &LandmarkSet) -> FrameGeometry {
        let left_hip = landmarks.get(PoseLandmark::LeftHip).point();
        let right_hip = landmarks.get(PoseLandmark::RightHip).point();
        let left_shoulder = landmarks.get(PoseLandmark::LeftShoulder).point();
        let right_shoulder = landmarks.get(PoseLandmark::RightShoulder).point();

        let centroid = left_hip.midpoint(&right_hip);
        let shoulder_y = (left_shoulder.y + right_shoulder.y) / 2.0;
        let torso_height = (centroid.y - shoulder_y).abs();

        FrameGeometry {
            centroid,
            torso_height,
            perspective_factor: perspective_factor(torso_height),
            bounding_box: bounding_box(landmarks),
        }
    }
}

/// `0.3 / max(0.05, torso_height)`; never exceeds 6.0.
pub fn perspective_factor(torso_height: f64) -> f64 {
    // 0.3 / 0.05 is not exactly 6.0 in f64
    if torso_height <= MIN_TORSO_HEIGHT {
        return MAX_PERSPECTIVE_FACTOR;
    }
    (REFERENCE_TORSO_HEIGHT / torso_height).min(MAX_PERSPECTIVE_FACTOR)
}

/// Padded box around every landmark, clamped to the frame.
pub fn bounding_box(landmarks: &LandmarkSet) -> BoundingBox {
    let (min_x, min_y, max_x, max_y) = landmarks.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(min_x, min_y, max_x, max_y), lm| {
            (min_x.min(lm.x), min_y.min(lm.y), max_x.max(lm.x), max_y.max(lm.y))
        },
    );

    let pad_x = (max_x - min_x) * BOX_PADDING;
    let pad_y = (max_y - min_y) * BOX_PADDING;

    BoundingBox::from_corners(
        clamp_unit(min_x - pad_x),
        clamp_unit(min_y - pad_y),
        clamp_unit(max_x + pad_x),
        clamp_unit(max_y + pad_y),
    )
}

fn clamp_unit(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use runwatch_models::Landmark;

    /// Standing pose: shoulders at `shoulder_y`, hips at `hip_y`, centered on `cx`.
    fn pose(cx: f64, shoulder_y: f64, hip_y: f64) -> LandmarkSet {
        let mut points = vec![Landmark::new(cx, (shoulder_y + hip_y) / 2.0); 33];
        points[11] = Landmark::new(cx - 0.05, shoulder_y);
        points[12] = Landmark::new(cx + 0.05, shoulder_y);
        points[23] = Landmark::new(cx - 0.04, hip_y);
        points[24] = Landmark::new(cx + 0.04, hip_y);
        LandmarkSet::new(points).unwrap()
    }

    #[test]
    fn test_centroid_is_hip_midpoint() {
        let geometry = GeometryNormalizer::new().normalize(&pose(0.5, 0.3, 0.6));
        assert!((geometry.centroid.x - 0.5).abs() < 1e-12);
        assert!((geometry.centroid.y - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_reference_torso_gives_unit_factor() {
        let geometry = GeometryNormalizer::new().normalize(&pose(0.5, 0.3, 0.6));
        assert!((geometry.torso_height - 0.3).abs() < 1e-12);
        assert!((geometry.perspective_factor - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_distant_subject_amplified() {
        let geometry = GeometryNormalizer::new().normalize(&pose(0.5, 0.45, 0.6));
        assert!((geometry.perspective_factor - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_perspective_floor() {
        for h in [0.0, 0.01, 0.03, 0.05] {
            assert_eq!(perspective_factor(h), 6.0);
        }
        assert!(perspective_factor(0.050_000_1) <= MAX_PERSPECTIVE_FACTOR);
        let geometry = GeometryNormalizer::new().normalize(&pose(0.5, 0.6, 0.6));
        assert_eq!(geometry.perspective_factor, 6.0);
    }

    #[test]
    fn test_bounding_box_padding() {
        let mut points = vec![Landmark::new(0.4, 0.4); 33];
        points[0] = Landmark::new(0.3, 0.2);
        points[1] = Landmark::new(0.5, 0.6);
        let bbox = bounding_box(&LandmarkSet::new(points).unwrap());

        assert!((bbox.x - 0.28).abs() < 1e-9);
        assert!((bbox.y - 0.16).abs() < 1e-9);
        assert!((bbox.max_x() - 0.52).abs() < 1e-9);
        assert!((bbox.max_y() - 0.64).abs() < 1e-9);
    }

    #[test]
    fn test_bounding_box_clamped_to_frame() {
        let mut points = vec![Landmark::new(0.5, 0.5); 33];
        points[0] = Landmark::new(-0.1, 0.0);
        points[1] = Landmark::new(1.05, 1.0);
        let bbox = bounding_box(&LandmarkSet::new(points).unwrap());

        assert_eq!(bbox.x, 0.0);
        assert_eq!(bbox.y, 0.0);
        assert_eq!(bbox.max_x(), 1.0);
        assert_eq!(bbox.max_y(), 1.0);
        assert!(bbox.is_valid());
    }
}
