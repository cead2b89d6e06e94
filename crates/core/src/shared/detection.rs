use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::bounding_box::BoundingBox;

pub const NEUTRAL_EXPRESSION: &str = "neutral";

/// One face reported by the external detector for a single frame.
///
/// Carries no identity: association across frames is the tracker's job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    /// Expression label → probability. Scores sum to roughly 1.
    #[serde(default)]
    pub expressions: BTreeMap<String, f64>,
    #[serde(default)]
    pub age: Option<f64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub gender_probability: Option<f64>,
}

impl Detection {
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            expressions: BTreeMap::new(),
            age: None,
            gender: None,
            gender_probability: None,
        }
    }

    pub fn with_expression(mut self, label: &str, score: f64) -> Self {
        self.expressions.insert(label.to_string(), score);
        self
    }

    /// Highest-scoring expression other than neutral.
    ///
    /// Falls back to neutral when it is the only expression reported,
    /// and to `None` when there are no scores at all.
    pub fn dominant_expression(&self) -> Option<&str> {
        let best = self
            .expressions
            .iter()
            .filter(|(label, score)| label.as_str() != NEUTRAL_EXPRESSION && score.is_finite())
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal));

        match best {
            Some((label, _)) => Some(label.as_str()),
            None => self
                .expressions
                .contains_key(NEUTRAL_EXPRESSION)
                .then_some(NEUTRAL_EXPRESSION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection() -> Detection {
        Detection::new(BoundingBox::new(0.0, 0.0, 100.0, 100.0))
    }

    #[test]
    fn test_dominant_expression_skips_neutral() {
        let d = detection()
            .with_expression("neutral", 0.7)
            .with_expression("happy", 0.2)
            .with_expression("sad", 0.1);
        assert_eq!(d.dominant_expression(), Some("happy"));
    }

    #[test]
    fn test_dominant_expression_only_neutral() {
        let d = detection().with_expression("neutral", 1.0);
        assert_eq!(d.dominant_expression(), Some("neutral"));
    }

    #[test]
    fn test_dominant_expression_empty() {
        assert_eq!(detection().dominant_expression(), None);
    }

    #[test]
    fn test_deserialize_detector_payload() {
        let json = r#"{
            "box": {"x": 10, "y": 20, "width": 120, "height": 140},
            "expressions": {"happy": 0.8, "neutral": 0.2},
            "age": 31.4,
            "gender": "female",
            "gender_probability": 0.93
        }"#;
        let d: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(d.bbox, BoundingBox::new(10.0, 20.0, 120.0, 140.0));
        assert_eq!(d.gender.as_deref(), Some("female"));
        assert_eq!(d.dominant_expression(), Some("happy"));
    }

    #[test]
    fn test_deserialize_box_only() {
        let json = r#"{"box": {"x": 0, "y": 0, "width": 1, "height": 1}}"#;
        let d: Detection = serde_json::from_str(json).unwrap();
        assert!(d.expressions.is_empty());
        assert!(d.age.is_none());
    }
}
