use serde::Serialize;

use crate::narration::domain::speed_category::{SpeedCategory, SpeedThresholds};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::detection::NEUTRAL_EXPRESSION;
use crate::tracking::domain::face_id::FaceId;
use crate::tracking::domain::face_tracker::TrackedDetection;

/// Everything an overlay renderer needs to draw one tracked face.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FaceAnnotation {
    pub id: FaceId,
    pub bbox: BoundingBox,
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub gender_probability: Option<f64>,
    pub emotion: String,
    pub speed: Option<f64>,
    /// Movement direction in radians, for drawing a motion arrow.
    pub heading: Option<f64>,
    pub category: SpeedCategory,
    pub primary: bool,
}

impl FaceAnnotation {
    pub fn from_tracked(face: &TrackedDetection, thresholds: &SpeedThresholds, primary: bool) -> Self {
        let detection = &face.detection;
        Self {
            id: face.id,
            bbox: detection.bbox,
            age: detection.age,
            gender: detection.gender.clone(),
            gender_probability: detection.gender_probability,
            emotion: detection
                .dominant_expression()
                .unwrap_or(NEUTRAL_EXPRESSION)
                .to_string(),
            speed: face.speed,
            heading: face.heading,
            category: thresholds.classify(face.speed),
            primary,
        }
    }

    /// One-line overlay text. Unknown age or gender are left out.
    pub fn label(&self) -> String {
        let mut parts = vec![self.id.to_string()];
        if let Some(age) = self.age {
            parts.push(format!("{}y", age.round() as i64));
        }
        if let Some(gender) = &self.gender {
            match self.gender_probability {
                Some(p) => parts.push(format!("{gender} ({}%)", (p * 100.0).round() as i64)),
                None => parts.push(gender.clone()),
            }
        }
        parts.push(self.emotion.clone());
        parts.push(match self.speed {
            Some(speed) => format!("{} px/s ({})", speed.round() as i64, self.category),
            None => "measuring…".to_string(),
        });
        parts.join(" · ")
    }
}
