//! Decoder for SSD-style heads emitting one `[1, 1, N, 7]` tensor.
//!
//! Each of the `N` slots is a record
//! `[image_id, class_id, confidence, x1, y1, x2, y2]` with corners
//! normalized to `[0, 1]`. The head already suppresses duplicates.

use super::detection::Detection;
use super::output_decoder::{DecodeContext, OutputDecoder};
use super::output_tensor::OutputTensor;
use crate::shared::bounding_box::BoundingBox;

const RECORD_LEN: usize = 7;

#[derive(Clone, Copy, Debug, Default)]
pub struct FixedSlotDecoder;

impl FixedSlotDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl OutputDecoder for FixedSlotDecoder {
    fn decode(&self, outputs: &[OutputTensor], ctx: &DecodeContext) -> Vec<Detection> {
        let Some(tensor) = outputs
            .iter()
            .find(|t| t.rank() == 4 && t.last_dim() >= RECORD_LEN)
        else {
            log::debug!("no [1, 1, N, 7] output among {} tensors", outputs.len());
            return Vec::new();
        };

        let record_len = tensor.last_dim();
        let slots = tensor.shape()[2];
        let data = tensor.data();
        let w = ctx.source_width as f32;
        let h = ctx.source_height as f32;

        data.chunks_exact(record_len)
            .take(slots)
            .map(|r| {
                let bbox = BoundingBox::from_truncated_corners(
                    r[3] * w,
                    r[4] * h,
                    r[5] * w,
                    r[6] * h,
                    ctx.source_width,
                    ctx.source_height,
                );
                Detection::new(r[1].max(0.0) as u32, r[2], bbox)
            })
            .collect()
    }
}
