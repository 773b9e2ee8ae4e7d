use serde::Serialize;

use crate::shared::bounding_box::BoundingBox;

/// A facial landmark in source-image pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One detected face.
///
/// `landmarks` is only populated by model families that regress keypoints.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detection {
    pub class_id: u32,
    pub confidence: f32,
    pub bounding_box: BoundingBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Vec<Point>>,
}

impl Detection {
    pub fn new(class_id: u32, confidence: f32, bounding_box: BoundingBox) -> Self {
        Self {
            class_id,
            confidence,
            bounding_box,
            landmarks: None,
        }
    }

    pub fn with_landmarks(mut self, landmarks: Vec<Point>) -> Self {
        self.landmarks = if landmarks.is_empty() {
            None
        } else {
            Some(landmarks)
        };
        self
    }

    /// Keeps detections whose confidence is at least `min_confidence`.
    pub fn filter_confident(detections: Vec<Detection>, min_confidence: f32) -> Vec<Detection> {
        detections
            .into_iter()
            .filter(|d| d.confidence >= min_confidence)
            .collect()
    }
}
