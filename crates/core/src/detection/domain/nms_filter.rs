//! Greedy non-maximum suppression, independent of any model family.

use serde::{Deserialize, Serialize};

use super::detection::Detection;
use crate::shared::bounding_box::BoundingBox;

/// Indices of the boxes that survive greedy NMS, in descending score order.
///
/// Only boxes scoring strictly above `score_threshold` are considered. Ties
/// keep their input order. A box is suppressed when its IoU with an already
/// accepted box exceeds `iou_threshold`. `top_k > 0` caps the result length.
pub fn suppress(
    boxes: &[BoundingBox],
    scores: &[f32],
    score_threshold: f32,
    iou_threshold: f32,
    top_k: usize,
) -> Vec<usize> {
    debug_assert_eq!(boxes.len(), scores.len(), "one score per box");

    let mut candidates: Vec<usize> = scores
        .iter()
        .enumerate()
        .take(boxes.len())
        .filter(|(_, &s)| s > score_threshold)
        .map(|(i, _)| i)
        .collect();
    candidates.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; candidates.len()];

    for i in 0..candidates.len() {
        if suppressed[i] {
            continue;
        }
        let current = candidates[i];
        keep.push(current);
        if top_k > 0 && keep.len() == top_k {
            break;
        }
        for j in (i + 1)..candidates.len() {
            if suppressed[j] {
                continue;
            }
            if boxes[current].iou(&boxes[candidates[j]]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }
    keep
}

/// Thresholds for one NMS pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NmsParams {
    pub score_threshold: f32,
    pub iou_threshold: f32,
    #[serde(default)]
    pub top_k: usize,
}

impl NmsParams {
    pub fn new(score_threshold: f32, iou_threshold: f32) -> Self {
        Self {
            score_threshold,
            iou_threshold,
            top_k: 0,
        }
    }

    /// Run NMS over detections, returning survivors in descending score order.
    pub fn apply(&self, detections: Vec<Detection>) -> Vec<Detection> {
        let boxes: Vec<BoundingBox> = detections.iter().map(|d| d.bounding_box).collect();
        let scores: Vec<f32> = detections.iter().map(|d| d.confidence).collect();
        let keep = suppress(
            &boxes,
            &scores,
            self.score_threshold,
            self.iou_threshold,
            self.top_k,
        );

        let mut slots: Vec<Option<Detection>> = detections.into_iter().map(Some).collect();
        keep.into_iter().filter_map(|i| slots[i].take()).collect()
    }
}
