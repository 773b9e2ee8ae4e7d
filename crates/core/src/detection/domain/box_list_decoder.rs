//! Decoder for ATSS-style heads emitting `[box_count, >=5]` box lists.
//!
//! Rows are `[x1, y1, x2, y2, confidence, ...]` in model-input pixels.

use super::detection::Detection;
use super::output_decoder::{DecodeContext, OutputDecoder};
use super::output_tensor::OutputTensor;
use crate::shared::bounding_box::BoundingBox;

const MIN_ROW_LEN: usize = 5;

#[derive(Clone, Copy, Debug, Default)]
pub struct BoxListDecoder;

impl BoxListDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl OutputDecoder for BoxListDecoder {
    fn decode(&self, outputs: &[OutputTensor], ctx: &DecodeContext) -> Vec<Detection> {
        let rw = ctx.ratio_w();
        let rh = ctx.ratio_h();
        let mut detections = Vec::new();

        for (i, tensor) in outputs.iter().enumerate() {
            let row_len = tensor.last_dim();
            if tensor.rank() < 2 || row_len < MIN_ROW_LEN {
                log::debug!("skipping output {i} with shape {:?}", tensor.shape());
                continue;
            }

            detections.extend(tensor.data().chunks_exact(row_len).map(|r| {
                let bbox = BoundingBox::from_truncated_corners(
                    r[0] * rw,
                    r[1] * rh,
                    r[2] * rw,
                    r[3] * rh,
                    ctx.source_width,
                    ctx.source_height,
                );
                Detection::new(0, r[4], bbox)
            }));
        }

        detections
    }
}
