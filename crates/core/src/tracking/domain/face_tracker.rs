use crate::shared::detection::Detection;

use super::face_id::FaceId;

/// A detection annotated with the identity it was associated with.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedDetection {
    pub id: FaceId,
    pub detection: Detection,
    /// Smoothed speed in pixels/second, `None` while still measuring.
    pub speed: Option<f64>,
    /// Direction of the latest movement in radians, `atan2(vy, vx)` with
    /// y pointing down the frame. `None` until the face has moved.
    pub heading: Option<f64>,
}

/// Domain interface for cross-frame face association.
///
/// Called once per frame with that frame's detections; returns them in the
/// same order, each carrying a stable identity.
pub trait FaceTracker: Send {
    fn track(&mut self, detections: Vec<Detection>, frame_index: u64) -> Vec<TrackedDetection>;

    /// Current speed estimate for a live identity.
    fn speed_of(&self, id: FaceId) -> Option<f64>;

    fn heading_of(&self, id: FaceId) -> Option<f64>;

    fn tracked_count(&self) -> usize;

    /// Drop every identity and the previous-frame snapshot.
    fn reset(&mut self);
}

/// The face with the widest box, which drives narration.
pub fn primary_face(faces: &[TrackedDetection]) -> Option<&TrackedDetection> {
    faces.iter().fold(None, |best: Option<&TrackedDetection>, face| match best {
        Some(b) if b.detection.bbox.width >= face.detection.bbox.width => Some(b),
        _ => Some(face),
    })
}
