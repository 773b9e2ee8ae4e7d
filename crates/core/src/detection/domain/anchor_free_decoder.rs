//! Decoder for anchor-free heads with Distribution Focal Loss box regression
//! and keypoints (YOLOv8-face layout).
//!
//! Each output is one feature map shaped `[1, C, feat_h, feat_w]` in planar
//! layout. Channels are grouped as
//! `[box distributions (reg_max * 4) | class logits | keypoints (x, y, vis) * K]`.
//! A cell's box edges are recovered as the expectation of a softmax over
//! `reg_max` bins, scaled by the feature map's stride.

use super::detection::{Detection, Point};
use super::output_decoder::{DecodeContext, OutputDecoder};
use super::output_tensor::OutputTensor;
use crate::shared::bounding_box::BoundingBox;

pub const DEFAULT_NUM_CLASSES: usize = 1;
pub const DEFAULT_REG_MAX: usize = 16;
pub const DEFAULT_NUM_KEYPOINTS: usize = 5;

/// Cells whose class probability is not above this are rejected early.
const CONFIDENCE_GATE: f32 = 0.5;

/// Left, top, right, bottom.
const BOX_EDGES: usize = 4;

/// x, y, visibility logit.
const KEYPOINT_VALUES: usize = 3;

#[derive(Clone, Copy, Debug)]
pub struct AnchorFreeDecoder {
    num_classes: usize,
    reg_max: usize,
    num_keypoints: usize,
}

impl Default for AnchorFreeDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_CLASSES, DEFAULT_REG_MAX, DEFAULT_NUM_KEYPOINTS)
    }
}

impl AnchorFreeDecoder {
    pub fn new(num_classes: usize, reg_max: usize, num_keypoints: usize) -> Self {
        Self {
            num_classes,
            reg_max,
            num_keypoints,
        }
    }

    /// Channels a feature map must carry for this layout.
    pub fn channels(&self) -> usize {
        self.reg_max * BOX_EDGES + self.num_classes + self.num_keypoints * KEYPOINT_VALUES
    }

    fn decode_feature_map(
        &self,
        tensor: &OutputTensor,
        ctx: &DecodeContext,
        out: &mut Vec<Detection>,
    ) -> bool {
        let shape = tensor.shape();
        if shape.len() != 4 || shape[0] == 0 || shape[1] < self.channels() {
            return false;
        }
        let (feat_h, feat_w) = (shape[2], shape[3]);
        if feat_h == 0 || feat_w == 0 || self.num_classes == 0 || self.reg_max == 0 {
            return false;
        }

        let area = feat_h * feat_w;
        let data = &tensor.data()[..shape[1] * area];
        let stride = (ctx.input.height as f32 / feat_h as f32).ceil();
        let cls_offset = area * self.reg_max * BOX_EDGES;
        let kp_offset = area * (self.reg_max * BOX_EDGES + self.num_classes);
        let (rw, rh) = (ctx.ratio_w(), ctx.ratio_h());

        let mut bins = vec![0.0f32; self.reg_max];
        let mut probs = vec![0.0f32; self.reg_max];

        for row in 0..feat_h {
            for col in 0..feat_w {
                let idx = row * feat_w + col;

                let max_conf = (0..self.num_classes)
                    .map(|k| data[cls_offset + k * area + idx])
                    .fold(f32::NEG_INFINITY, f32::max);
                let box_prob = sigmoid(max_conf);
                if box_prob <= CONFIDENCE_GATE {
                    continue;
                }

                let mut ltrb = [0.0f32; BOX_EDGES];
                for (edge, dist) in ltrb.iter_mut().enumerate() {
                    for (n, bin) in bins.iter_mut().enumerate() {
                        *bin = data[(edge * self.reg_max + n) * area + idx];
                    }
                    softmax(&bins, &mut probs);
                    *dist = dfl_expectation(&probs) * stride;
                }

                let cx = (col as f32 + 0.5) * stride;
                let cy = (row as f32 + 0.5) * stride;
                let bbox = BoundingBox::from_corners(
                    (cx - ltrb[0]) * rw,
                    (cy - ltrb[1]) * rh,
                    (cx + ltrb[2]) * rw,
                    (cy + ltrb[3]) * rh,
                    ctx.source_width,
                    ctx.source_height,
                );

                let landmarks = (0..self.num_keypoints)
                    .map(|k| {
                        let base = kp_offset + k * KEYPOINT_VALUES * area + idx;
                        let raw_x = data[base];
                        let raw_y = data[base + area];
                        Point::new(
                            (raw_x * 2.0 + col as f32) * stride * rw,
                            (raw_y * 2.0 + row as f32) * stride * rh,
                        )
                    })
                    .collect();

                out.push(Detection::new(0, box_prob, bbox).with_landmarks(landmarks));
            }
        }
        true
    }
}

impl OutputDecoder for AnchorFreeDecoder {
    fn decode(&self, outputs: &[OutputTensor], ctx: &DecodeContext) -> Vec<Detection> {
        let mut candidates = Vec::new();
        for (i, tensor) in outputs.iter().enumerate() {
            if !self.decode_feature_map(tensor, ctx, &mut candidates) {
                log::debug!("skipping output {i} with shape {:?}", tensor.shape());
            }
        }
        candidates
    }
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax of `logits` into `out`.
pub fn softmax(logits: &[f32], out: &mut [f32]) {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for (o, &l) in out.iter_mut().zip(logits) {
        *o = (l - max).exp();
        sum += *o;
    }
    if sum > 0.0 {
        for o in out.iter_mut() {
            *o /= sum;
        }
    }
}

/// Expected bin index `Σ n · p[n]` of a discrete distribution.
pub fn dfl_expectation(probs: &[f32]) -> f32 {
    probs
        .iter()
        .enumerate()
        .map(|(n, p)| n as f32 * p)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::inference_engine::InputGeometry;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const CHANNELS: usize = DEFAULT_REG_MAX * 4 + DEFAULT_NUM_CLASSES + DEFAULT_NUM_KEYPOINTS * 3;
    const CLS_CHANNEL: usize = DEFAULT_REG_MAX * 4;
    const KP_CHANNEL: usize = CLS_CHANNEL + DEFAULT_NUM_CLASSES;

    /// Planar `[1, CHANNELS, h, w]` feature map with every class logit low.
    struct FeatureMap {
        h: usize,
        w: usize,
        data: Vec<f32>,
    }

    impl FeatureMap {
        fn new(h: usize, w: usize) -> Self {
            let mut map = Self {
                h,
                w,
                data: vec![0.0; CHANNELS * h * w],
            };
            for row in 0..h {
                for col in 0..w {
                    map.set(CLS_CHANNEL, row, col, -10.0);
                }
            }
            map
        }

        fn set(&mut self, channel: usize, row: usize, col: usize, v: f32) {
            let area = self.h * self.w;
            self.data[channel * area + row * self.w + col] = v;
        }

        /// Put all probability mass of every edge distribution on `bin`.
        fn hot_bin(&mut self, row: usize, col: usize, bin: usize) {
            for edge in 0..4 {
                self.set(edge * DEFAULT_REG_MAX + bin, row, col, 30.0);
            }
        }

        fn into_tensor(self) -> OutputTensor {
            OutputTensor::new(vec![1, CHANNELS, self.h, self.w], self.data).unwrap()
        }
    }

    fn ctx(source: u32, input: u32) -> DecodeContext {
        DecodeContext::new(source, source, InputGeometry::square(input))
    }

    #[test]
    fn test_confident_single_cell_yields_one_candidate() {
        let mut map = FeatureMap::new(1, 1);
        map.set(CLS_CHANNEL, 0, 0, 2.0);
        let dets = AnchorFreeDecoder::default().decode(&[map.into_tensor()], &ctx(64, 32));

        assert_eq!(dets.len(), 1);
        assert_relative_eq!(dets[0].confidence, sigmoid(2.0));
        assert_eq!(dets[0].landmarks.as_ref().map(Vec::len), Some(5));
    }

    #[test]
    fn test_unconfident_single_cell_yields_nothing() {
        let mut map = FeatureMap::new(1, 1);
        map.set(CLS_CHANNEL, 0, 0, -2.0);
        let dets = AnchorFreeDecoder::default().decode(&[map.into_tensor()], &ctx(64, 32));
        assert!(dets.is_empty());
    }

    #[test]
    fn test_even_odds_are_rejected() {
        let mut map = FeatureMap::new(1, 1);
        map.set(CLS_CHANNEL, 0, 0, 0.0);
        let dets = AnchorFreeDecoder::default().decode(&[map.into_tensor()], &ctx(64, 32));
        assert!(dets.is_empty());
    }

    #[test]
    fn test_box_and_keypoints_geometry() {
        // 4x4 map over a 32px input: stride 8. Source is 64px: ratio 2.
        let mut map = FeatureMap::new(4, 4);
        let (row, col) = (1, 2);
        map.set(CLS_CHANNEL, row, col, 3.0);
        map.hot_bin(row, col, 1);
        map.set(KP_CHANNEL, row, col, 0.25);
        map.set(KP_CHANNEL + 1, row, col, 0.5);

        let dets = AnchorFreeDecoder::default().decode(&[map.into_tensor()], &ctx(64, 32));
        assert_eq!(dets.len(), 1);

        // cx = 20, cy = 12, every edge = 8 → [12, 4, 28, 20] * 2
        assert_eq!(dets[0].bounding_box, BoundingBox::new(24, 8, 32, 32));

        let first = dets[0].landmarks.as_ref().unwrap()[0];
        assert_relative_eq!(first.x, 40.0, epsilon = 1e-4);
        assert_relative_eq!(first.y, 32.0, epsilon = 1e-4);
    }

    #[test]
    fn test_stride_rounds_up() {
        // 3 rows over a 32px input: stride ceil(10.67) = 11.
        let mut map = FeatureMap::new(3, 3);
        map.set(CLS_CHANNEL, 0, 0, 3.0);
        map.hot_bin(0, 0, 0);
        let dets = AnchorFreeDecoder::default().decode(&[map.into_tensor()], &ctx(32, 32));

        // Zero-length edges put both corners at the cell centre (5.5, 5.5).
        assert_eq!(dets[0].bounding_box, BoundingBox::new(5, 5, 0, 0));
        let first = dets[0].landmarks.as_ref().unwrap()[0];
        assert_relative_eq!(first.x, 0.0);
    }

    #[test]
    fn test_scans_every_feature_map() {
        let mut coarse = FeatureMap::new(1, 1);
        coarse.set(CLS_CHANNEL, 0, 0, 4.0);
        let mut fine = FeatureMap::new(2, 2);
        fine.set(CLS_CHANNEL, 1, 1, 4.0);
        fine.set(CLS_CHANNEL, 0, 1, 4.0);

        let dets = AnchorFreeDecoder::default().decode(
            &[coarse.into_tensor(), fine.into_tensor()],
            &ctx(64, 64),
        );
        assert_eq!(dets.len(), 3);
    }

    #[test]
    fn test_boxes_are_clamped_inside_image() {
        let mut map = FeatureMap::new(2, 2);
        for (row, col) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            map.set(CLS_CHANNEL, row, col, 5.0);
            map.hot_bin(row, col, 15);
        }
        let dets = AnchorFreeDecoder::default().decode(&[map.into_tensor()], &ctx(50, 64));
        assert_eq!(dets.len(), 4);
        for d in &dets {
            assert!(d.bounding_box.is_within(50, 50), "{:?}", d.bounding_box);
        }
    }

    #[test]
    fn test_skips_malformed_outputs() {
        let flat = OutputTensor::new(vec![1, 80], vec![9.0; 80]).unwrap();
        let thin = OutputTensor::new(vec![1, 10, 1, 1], vec![9.0; 10]).unwrap();
        let empty = OutputTensor::new(vec![1, CHANNELS, 0, 4], vec![]).unwrap();
        let dets = AnchorFreeDecoder::default().decode(&[flat, thin, empty], &ctx(64, 32));
        assert!(dets.is_empty());
    }

    #[test]
    fn test_malformed_output_does_not_spoil_valid_maps() {
        let mut coarse = FeatureMap::new(1, 1);
        coarse.set(CLS_CHANNEL, 0, 0, 4.0);
        let thin = OutputTensor::new(vec![1, 10, 1, 1], vec![9.0; 10]).unwrap();
        let mut fine = FeatureMap::new(2, 2);
        fine.set(CLS_CHANNEL, 1, 0, 4.0);

        let dets = AnchorFreeDecoder::default().decode(
            &[coarse.into_tensor(), thin, fine.into_tensor()],
            &ctx(64, 64),
        );
        assert_eq!(dets.len(), 2);
        assert!(dets.iter().all(|d| d.landmarks.is_some()));
    }

    // ── Math helpers ─────────────────────────────────────────────────

    #[rstest]
    #[case::small(vec![0.1, -0.3, 2.0, 0.0])]
    #[case::large_positive(vec![1000.0, 999.0, 998.5, 1001.0])]
    #[case::large_negative(vec![-1000.0, -2000.0, -1500.0, -999.0])]
    #[case::mixed_extremes(vec![88.0, -88.0, 1e4, -1e4, 0.0, 3.5, 42.0, -7.0])]
    fn test_softmax_sums_to_one(#[case] logits: Vec<f32>) {
        let mut out = vec![0.0; logits.len()];
        softmax(&logits, &mut out);
        assert!(out.iter().all(|p| p.is_finite() && *p >= 0.0));
        assert_relative_eq!(out.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_softmax_sums_to_one_for_pseudo_random_logits() {
        let mut state: u32 = 0x9e37_79b9;
        for _ in 0..200 {
            let logits: Vec<f32> = (0..DEFAULT_REG_MAX)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 17;
                    state ^= state << 5;
                    (state % 20_000) as f32 / 10.0 - 1000.0
                })
                .collect();
            let mut out = vec![0.0; DEFAULT_REG_MAX];
            softmax(&logits, &mut out);
            assert_relative_eq!(out.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_uniform_distribution_expectation() {
        let mut out = vec![0.0; DEFAULT_REG_MAX];
        softmax(&[0.0; DEFAULT_REG_MAX], &mut out);
        assert_relative_eq!(dfl_expectation(&out), 7.5, epsilon = 1e-5);
    }

    #[rstest]
    #[case(0.0, 0.5)]
    #[case(10.0, 1.0)]
    #[case(-10.0, 0.0)]
    fn test_sigmoid(#[case] x: f32, #[case] expected: f32) {
        assert_relative_eq!(sigmoid(x), expected, epsilon = 1e-3);
    }
}
